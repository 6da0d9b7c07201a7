// Crowded sky opmode
use clap::{value_parser, Arg, ArgAction, Command};

pub fn subcommand() -> Command {
    Command::new("findmorethan12")
        .about("Find epochs where more than 12 GPS satellites are above an elevation mask")
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
        .arg(
            Arg::new("position")
                .short('p')
                .long("position")
                .value_name("\"X Y Z\"")
                .required(true)
                .help("Receiver ECEF position (m)"),
        )
        .arg(
            Arg::new("min-elev")
                .short('m')
                .long("min-elev")
                .value_name("DEGREES")
                .value_parser(value_parser!(f64))
                .default_value("0")
                .help("Elevation mask"),
        )
        .arg(
            Arg::new("start")
                .short('s')
                .long("start")
                .value_name("\"YYYY DOY SOD\"")
                .help("Start time. Default: earliest record."),
        )
        .arg(
            Arg::new("end")
                .short('E')
                .long("end")
                .value_name("\"YYYY DOY SOD\"")
                .help("End time. Default: latest record."),
        )
        .arg(
            Arg::new("step")
                .short('t')
                .long("step")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .default_value("10")
                .help("Time increment"),
        )
}
