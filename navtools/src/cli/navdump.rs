// Navigation data dump opmode
use clap::{Arg, ArgAction, Command};

const QUERY_HELP: &str = "\"navmsgtype YYYY/DOY/HH:MM:SS[/SRC/TGT] subject-sat-id system \
    [carrier [code [navtype [xmit-health [validity-type [xmit-sat-id system]]]]]]\"";

pub fn subcommand() -> Command {
    Command::new("navdump")
        .about("Dump any and all navigation data, or search specific records")
        .arg_required_else_help(true)
        .arg(
            Arg::new("files")
                .value_name("NAV-FILE")
                .num_args(1..)
                .action(ArgAction::Append)
                .required_unless_present("enum")
                .help(
                    "Navigation files (NAV RINEX v2, v3, v4 or Yuma almanac, \
                    possibly gzip compressed)",
                ),
        )
        .arg(
            Arg::new("type")
                .short('t')
                .long("type")
                .value_name("TYPE")
                .action(ArgAction::Append)
                .help(
                    "Navigation message type(s) to retain (use -E for a list). \
                    Default: all types.",
                ),
        )
        .arg(
            Arg::new("level")
                .short('l')
                .long("level")
                .value_name("DETAIL")
                .default_value("Full")
                .help("Detail level of the output: OneLine, Brief or Full"),
        )
        .next_help_heading("Queries")
        .arg(
            Arg::new("find")
                .short('F')
                .long("find")
                .value_name("QUERY")
                .action(ArgAction::Append)
                .help(format!("Find a specific record matching {}", QUERY_HELP)),
        )
        .arg(
            Arg::new("xvt")
                .short('X')
                .long("xvt")
                .value_name("QUERY")
                .action(ArgAction::Append)
                .help(format!(
                    "Compute a satellite state from the record matching {}. \
                    navmsgtype must be Ephemeris, Almanac, \
                    or Unknown for Almanac-if-no-Ephemeris.",
                    QUERY_HELP
                )),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help(
                    "Reject queries with invalid tokens, \
                    instead of replacing them with wildcards",
                ),
        )
        .arg(
            Arg::new("enum")
                .short('E')
                .long("enum")
                .action(ArgAction::SetTrue)
                .help("List the names accepted in queries and exit"),
        )
}
