//! Command-line definition and parsing.

use clap::{Arg, ArgAction, Command, builder::OsStringValueParser};
use metadata::AclGrant;
use std::ffi::OsString;
use std::path::PathBuf;

/// Program name used in help and diagnostics.
pub const PROGRAM_NAME: &str = "metarestore";

/// Parsed command produced by [`parse_args`].
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ParsedArgs {
    pub(crate) show_help: bool,
    pub(crate) show_version: bool,
    pub(crate) config: Option<PathBuf>,
    pub(crate) root: Option<PathBuf>,
    pub(crate) no_times: bool,
    pub(crate) no_owner: bool,
    pub(crate) no_ancestors: bool,
    pub(crate) acl_grant: Option<AclGrant>,
    pub(crate) verbose: u8,
    pub(crate) capture: bool,
    pub(crate) operands: Vec<OsString>,
}

/// Builds the `clap` command used for parsing.
pub(crate) fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Restore recorded timestamps and ownership onto local files.")
        .override_usage("metarestore [OPTIONS] MANIFEST\n       metarestore --capture PATH...")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .help("Show this help message and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .help("Output version information and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Read options from a JSON configuration file.")
                .value_parser(OsStringValueParser::new())
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("DIR")
                .help("Resolve relative record paths against DIR; ownership propagation stops below it.")
                .value_parser(OsStringValueParser::new())
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("no-times")
                .long("no-times")
                .help("Do not restore timestamps.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-owner")
                .long("no-owner")
                .help("Do not restore owners and groups.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-ancestors")
                .long("no-ancestors")
                .help("Apply ownership to the recorded path only, not its parent directories.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("acl-grant")
                .long("acl-grant")
                .value_name("GRANT")
                .help("DACL grant after ownership changes: none, owner, or creator-owner.")
                .value_parser(|value: &str| value.parse::<AclGrant>())
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase verbosity; repeat for more detail.")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("capture")
                .long("capture")
                .help("Print the current metadata of each PATH as manifest lines instead of restoring.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("operands")
                .value_name("MANIFEST|PATH")
                .help("Manifest to restore ('-' for stdin), or paths to capture.")
                .num_args(0..)
                .value_parser(OsStringValueParser::new())
                .action(ArgAction::Append),
        )
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from(PROGRAM_NAME));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        config: matches.remove_one::<OsString>("config").map(PathBuf::from),
        root: matches.remove_one::<OsString>("root").map(PathBuf::from),
        no_times: matches.get_flag("no-times"),
        no_owner: matches.get_flag("no-owner"),
        no_ancestors: matches.get_flag("no-ancestors"),
        acl_grant: matches.remove_one::<AclGrant>("acl-grant"),
        verbose: matches.get_count("verbose"),
        capture: matches.get_flag("capture"),
        operands: matches
            .remove_many::<OsString>("operands")
            .map(Iterator::collect)
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_operand_is_collected() {
        let parsed = parse_args(["metarestore", "records.jsonl"]).expect("parse");
        assert_eq!(parsed.operands, [OsString::from("records.jsonl")]);
        assert!(!parsed.capture);
    }

    #[test]
    fn toggles_and_counts_are_recognised() {
        let parsed = parse_args([
            "metarestore",
            "--no-times",
            "--no-ancestors",
            "-vv",
            "--acl-grant",
            "owner",
            "--root",
            "/dest",
            "-",
        ])
        .expect("parse");
        assert!(parsed.no_times);
        assert!(!parsed.no_owner);
        assert!(parsed.no_ancestors);
        assert_eq!(parsed.verbose, 2);
        assert_eq!(parsed.acl_grant, Some(AclGrant::Owner));
        assert_eq!(parsed.root, Some(PathBuf::from("/dest")));
        assert_eq!(parsed.operands, [OsString::from("-")]);
    }

    #[test]
    fn capture_accepts_many_paths() {
        let parsed = parse_args(["metarestore", "--capture", "a", "b"]).expect("parse");
        assert!(parsed.capture);
        assert_eq!(parsed.operands.len(), 2);
    }

    #[test]
    fn unknown_grant_is_rejected() {
        let error = parse_args(["metarestore", "--acl-grant=everyone", "m"]).expect_err("invalid");
        assert!(error.to_string().contains("everyone"));
    }

    #[test]
    fn empty_argument_list_defaults_program_name() {
        let parsed = parse_args(Vec::<OsString>::new()).expect("parse");
        assert_eq!(parsed, ParsedArgs::default());
    }
}
