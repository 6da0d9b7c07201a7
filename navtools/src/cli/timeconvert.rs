// Time conversion opmode
use clap::{value_parser, Arg, ArgAction, ArgGroup, Command};

pub fn subcommand() -> Command {
    Command::new("timeconvert")
        .about("Convert a time between formats and GNSS time systems")
        .long_about(
            "Converts from a given input time specification to other time formats.
When converting between time systems, GPS is the default source time system
when a time is specified, while UTC is the default source time system when
a time is not specified (current time).",
        )
        .next_help_heading("Input (exclusive)")
        .arg(
            Arg::new("civil")
                .short('c')
                .long("civil")
                .value_name("\"MONTH DAY YEAR HH:MM:SS\""),
        )
        .arg(
            Arg::new("rinex-file")
                .short('R')
                .long("rinex-file")
                .value_name("\"YY MM DD HH MM SS\""),
        )
        .arg(
            Arg::new("ws")
                .short('w')
                .long("ws")
                .value_name("\"FULLWEEK SOW\""),
        )
        .arg(
            Arg::new("mjd")
                .short('m')
                .long("mjd")
                .value_name("MJD"),
        )
        .arg(
            Arg::new("unixtime")
                .short('u')
                .long("unixtime")
                .value_name("\"SECONDS MICROSECONDS\""),
        )
        .arg(
            Arg::new("doy")
                .short('y')
                .long("doy")
                .value_name("\"YEAR DOY SOD\""),
        )
        .group(
            ArgGroup::new("input")
                .args(["civil", "rinex-file", "ws", "mjd", "unixtime", "doy"])
                .multiple(false),
        )
        .next_help_heading("Time systems")
        .arg(
            Arg::new("src-sys")
                .long("src-sys")
                .value_name("SYSTEM")
                .help("Source time system (GPS, GAL, BDT, QZS, UTC, TAI..)"),
        )
        .arg(
            Arg::new("tgt-sys")
                .long("tgt-sys")
                .value_name("SYSTEM")
                .help("Target time system"),
        )
        .arg(
            Arg::new("nav")
                .long("nav")
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Navigation files providing broadcast time offsets (NAV RINEX)"),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .action(ArgAction::SetTrue)
                .requires("tgt-sys")
                .conflicts_with("format")
                .help("Only display the offset (s) between both systems at this time"),
        )
        .next_help_heading("Output")
        .arg(
            Arg::new("add-offset")
                .short('a')
                .long("add-offset")
                .value_name("SECONDS")
                .action(ArgAction::Append)
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .help("Add seconds to the specified time"),
        )
        .arg(
            Arg::new("sub-offset")
                .short('s')
                .long("sub-offset")
                .value_name("SECONDS")
                .action(ArgAction::Append)
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .help("Subtract seconds from the specified time"),
        )
        .arg(
            Arg::new("format")
                .short('F')
                .long("format")
                .value_name("FORMAT")
                .help(
                    "Time format to use on output \
                    (%Y %m %d %H %M %S %f %j %s %F %G %w %g %Q %U %u %P)",
                ),
        )
}
