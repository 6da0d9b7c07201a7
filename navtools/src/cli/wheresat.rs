// Satellite positions opmode
use clap::{value_parser, Arg, ArgAction, Command};

const DEFAULT_FORMAT: &str = "%02m/%02d/%04Y %02H:%02M:%04.1f";

pub fn subcommand() -> Command {
    Command::new("wheresat")
        .about("Compute satellite positions over a time span, from broadcast ephemerides")
        .arg_required_else_help(true)
        .arg(
            Arg::new("eph")
                .short('e')
                .long("eph")
                .value_name("FILE")
                .num_args(1..)
                .action(ArgAction::Append)
                .required(true)
                .help("Ephemeris files (NAV RINEX)"),
        )
        .next_help_heading("Satellites")
        .arg(
            Arg::new("sat")
                .short('s')
                .long("sat")
                .value_name("SAT")
                .action(ArgAction::Append)
                .help(
                    "Satellite to process, like G01 (may be repeated). \
                    Default: every satellite with data.",
                ),
        )
        .arg(
            Arg::new("prn")
                .short('p')
                .long("prn")
                .value_name("PRN")
                .action(ArgAction::Append)
                .value_parser(value_parser!(u8))
                .help("GPS PRN to process (may be repeated)"),
        )
        .arg(
            Arg::new("ignore-health")
                .short('i')
                .long("ignore-health")
                .action(ArgAction::SetTrue)
                .help("Ignore satellite health and ephemeris validity"),
        )
        .next_help_heading("Time span")
        .arg(
            Arg::new("start")
                .long("start")
                .value_name("\"MM/DD/YYYY HH:MM:SS\"")
                .help("Start time. Default: earliest record."),
        )
        .arg(
            Arg::new("end")
                .long("end")
                .value_name("\"MM/DD/YYYY HH:MM:SS\"")
                .help("End time. Default: latest record."),
        )
        .arg(
            Arg::new("step")
                .short('t')
                .long("step")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .default_value("900")
                .help("Time increment"),
        )
        .next_help_heading("Output")
        .arg(
            Arg::new("position")
                .short('u')
                .long("position")
                .value_name("\"X Y Z\"")
                .help("Receiver ECEF position (m): adds azimuth, elevation and range"),
        )
        .arg(
            Arg::new("velocity")
                .short('V')
                .long("velocity")
                .action(ArgAction::SetTrue)
                .help("Print satellite velocities"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .default_value(DEFAULT_FORMAT)
                .help("Time format (%Y %m %d %H %M %S %f %j %s %F %w %g %Q tokens)"),
        )
}
