use std::{io::Write, process::Output, time::Duration};

use assert_cmd::Command;
use predicates::prelude::*;

const NAV_V2: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../test_resources/NAV/V2/brdc2000.15n"
);

const YUMA: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../test_resources/ALMANAC/almanac.yuma.week0830.061440.txt"
);

fn navtools() -> Command {
    Command::cargo_bin("navtools").unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn navdump_records() {
    let output = navtools()
        .args(["navdump", "-l", "OneLine", NAV_V2])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().count(), 11);

    let output = navtools()
        .args(["navdump", "-l", "oneline", "-t", "Ephemeris", "-t", "Iono", NAV_V2])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().count(), 4);

    // almanac and ephemerides, from different formats
    let output = navtools()
        .args(["navdump", "-l", "OneLine", "-t", "almanac", NAV_V2, YUMA])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().count(), 3);
}

#[test]
fn navdump_queries() {
    navtools()
        .args([
            "navdump",
            "-l",
            "Brief",
            "-F",
            "ephemeris 2015/200/00:15:00 13 GPS",
            NAV_V2,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("IODE: 11"));

    navtools()
        .args([
            "navdump",
            "-F",
            "ephemeris 2015/200/00:15:00 99 GPS",
            NAV_V2,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not found"));

    navtools()
        .args([
            "navdump",
            "-X",
            "ephemeris 2015/200/00:15:00 13 GPS",
            "-X",
            "unknown 2015/200/00:15:00 14 GPS Any Any Any Healthy",
            NAV_V2,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("x:(").and(predicate::str::contains("Not found")));
}

#[test]
fn navdump_invalid_inputs() {
    for args in [
        vec!["navdump", "-F", "ephemeris 2015/200", NAV_V2],
        vec!["navdump", "-F", "ephemeris 2015/200/00:00:00 13", NAV_V2],
        vec![
            "navdump",
            "--strict",
            "-F",
            "ephemerides 2015/200/00:00:00 13 GPS",
            NAV_V2,
        ],
        vec!["navdump", "-t", "Bogus", NAV_V2],
        vec!["navdump", "-l", "verbose", NAV_V2],
        vec!["navdump", "/does/not/exist.15n"],
    ] {
        navtools().args(&args).assert().code(2);
    }

    let mut garbage = tempfile::NamedTempFile::new().unwrap();
    writeln!(garbage, "this is not navigation data").unwrap();
    navtools()
        .args(["navdump", garbage.path().to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unable to load"));
}

#[test]
fn navdump_enumerations() {
    navtools()
        .args(["navdump", "-E"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Ephemeris")
                .and(predicate::str::contains("GPS_LNAV"))
                .and(predicate::str::contains("ValidOnly")),
        );
}

#[test]
fn wheresat_positions() {
    let output = navtools()
        .args([
            "wheresat",
            "-e",
            NAV_V2,
            "-p",
            "13",
            "--start",
            "07/19/2015 00:00:00",
            "--end",
            "07/19/2015 01:00:00",
            "-u",
            "6378137 0 0",
            "-V",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = stdout(&output);
    let lines = stdout.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("# time, PRN"));
    assert!(lines[0].ends_with("Vz(m/s)"));
    assert!(lines[1].starts_with("07/19/2015 00:00:00.0  G13"));
    assert!(lines[5].starts_with("07/19/2015 01:00:00.0  G13"));
    for line in lines[1..].iter() {
        // time (2), sat, xyz, clock, az/el/range, velocity
        assert_eq!(line.split_ascii_whitespace().count(), 13, "{}", line);
    }
}

#[test]
fn wheresat_health() {
    let args = [
        "wheresat",
        "-e",
        NAV_V2,
        "-s",
        "G14",
        "--start",
        "07/19/2015 00:00:00",
        "--end",
        "07/19/2015 00:30:00",
    ];

    // unhealthy satellite only
    navtools().args(args).assert().code(1);

    let output = navtools().args(args).arg("-i").output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().count(), 4);

    navtools()
        .args(["wheresat", "-e", NAV_V2, "-s", "X99"])
        .assert()
        .code(2);
}

#[test]
fn scan_steps() {
    for args in [
        vec!["wheresat", "-e", NAV_V2, "-p", "13", "-t", "1e-12"],
        vec!["wheresat", "-e", NAV_V2, "-p", "13", "-t", "NaN"],
        vec!["wheresat", "-e", NAV_V2, "-p", "13", "-t", "0"],
        vec!["findmorethan12", "-e", NAV_V2, "-p", "6378137 0 0", "-t", "1e-12"],
        vec!["findmorethan12", "-e", NAV_V2, "-p", "6378137 0 0", "-t", "NaN"],
        vec!["findmorethan12", "-e", NAV_V2, "-p", "6378137 0 0", "-m", "NaN"],
    ] {
        navtools()
            .args(&args)
            .timeout(Duration::from_secs(30))
            .assert()
            .code(2);
    }
}

#[test]
fn out_of_range_times() {
    for args in [
        vec!["wheresat", "-e", NAV_V2, "--start", "01/01/99999999 00:00:00"],
        vec!["wheresat", "-e", NAV_V2, "--end", "02/30/2015 00:00:00"],
        vec!["findmorethan12", "-e", NAV_V2, "-p", "6378137 0 0", "-s", "2015 366 0"],
        vec!["timeconvert", "-m", "1e15"],
        vec!["timeconvert", "-w", "99999999999 0"],
        vec!["timeconvert", "-u", "1e300 0"],
        vec!["timeconvert", "-y", "2015 1 0", "-a", "1e300"],
    ] {
        navtools()
            .args(&args)
            .timeout(Duration::from_secs(30))
            .assert()
            .code(2);
    }
}

#[test]
fn findmorethan12_scan() {
    navtools()
        .args([
            "findmorethan12",
            "-e",
            NAV_V2,
            "-p",
            "6378137 0 0",
            "-s",
            "2015 200 0",
            "-E",
            "2015 200 600",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(
                "Start Time: 07/19/2015 00:00:00 End Time: 07/19/2015 00:10:00",
            )
                .and(predicate::str::contains("0 epoch(s) with more than 12 SVs above 0 degrees"))
                .and(predicate::str::contains("Found").not()),
        );

    navtools()
        .args(["findmorethan12", "-e", NAV_V2, "-p", "1 2"])
        .assert()
        .code(2);
}

#[test]
fn timeconvert_formats() {
    navtools()
        .args(["timeconvert", "-c", "5 6 1985 13:50:02"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("05/06/1985 13:50:02")
                .and(predicate::str::contains("46191.576412037"))
                .and(predicate::str::contains("1985 126"))
                .and(predicate::str::contains("484235402")),
        );

    for (input, expected) in [
        (["-y", "1985 126 49802"], "1985 126 49802\n"),
        (["-R", "85 05 06 13 50 02"], "1985 126 49802\n"),
        (["-w", "278 136202"], "1985 126 49802\n"),
        (["-u", "484235402 0"], "1985 126 49802\n"),
    ] {
        navtools()
            .arg("timeconvert")
            .args(input)
            .args(["-F", "%04Y %03j %05.0s"])
            .assert()
            .success()
            .stdout(expected);
    }

    navtools()
        .args(["timeconvert", "-y", "1985 126 49802", "-s", "86400", "-F", "%4Y %03j %.0s"])
        .assert()
        .success()
        .stdout("1985 125 49802\n");
}

#[test]
fn timeconvert_systems() {
    navtools()
        .args([
            "timeconvert",
            "-y",
            "2021 2 0",
            "--tgt-sys",
            "UTC",
            "-F",
            "%02m/%02d/%04Y %02H:%02M:%02S %P",
        ])
        .assert()
        .success()
        .stdout("01/01/2021 23:59:42 UTC\n");

    navtools()
        .args(["timeconvert", "-y", "2021 2 0", "--tgt-sys", "UTC", "--offset"])
        .assert()
        .success()
        .stdout("-18\n");

    // broadcast GPS-UTC offset
    let output = navtools()
        .args([
            "timeconvert",
            "-w",
            "1854 233472",
            "--nav",
            NAV_V2,
            "--tgt-sys",
            "UTC",
            "--offset",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let offset = stdout(&output).trim().parse::<f64>().unwrap();
    assert!((offset + 17.0).abs() < 1.0E-6);
    assert_ne!(offset, -17.0);

    // no GPS-GAL offset in there
    navtools()
        .args(["timeconvert", "-w", "1854 233472", "--nav", NAV_V2, "--tgt-sys", "GAL"])
        .assert()
        .code(1);

    navtools()
        .args(["timeconvert", "-y", "2021 400 0"])
        .assert()
        .code(2);
    navtools()
        .args(["timeconvert", "--tgt-sys", "XYZ"])
        .assert()
        .code(2);
}
