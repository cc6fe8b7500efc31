//! Tests for installer CLI parsing and default behaviours.

use super::*;
use rstest::rstest;

#[test]
fn install_parses_defaults() {
    let cli = Cli::parse_from(["kfx-installer", "install"]);
    match cli.command {
        Command::Install(args) => {
            assert_eq!(args.channel, ChannelArg::Stable);
            assert!(!args.yes);
        }
        other => panic!("expected Install command, got {other:?}"),
    }
    assert!(cli.global.install_root.is_none());
    assert!(cli.global.config.is_none());
    assert!(cli.global.api_endpoint.is_none());
    assert_eq!(cli.global.verbosity, 0);
    assert!(!cli.global.quiet);
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["kfx-installer"]).is_err());
}

#[test]
fn global_flags_are_accepted_after_subcommand() {
    let cli = Cli::parse_from([
        "kfx-installer",
        "check",
        "--install-root",
        "/games/keeperfx",
        "--config",
        "/etc/kfx/launcher.toml",
    ]);
    assert_eq!(
        cli.global.install_root,
        Some(Utf8PathBuf::from("/games/keeperfx"))
    );
    assert_eq!(
        cli.global.config,
        Some(Utf8PathBuf::from("/etc/kfx/launcher.toml"))
    );
}

#[rstest]
#[case::stable("stable", ChannelArg::Stable)]
#[case::alpha("alpha", ChannelArg::Alpha)]
fn update_parses_channel(#[case] name: &str, #[case] expected: ChannelArg) {
    let cli = Cli::parse_from(["kfx-installer", "update", "--channel", name, "--yes"]);
    match cli.command {
        Command::Update(args) => {
            assert_eq!(args.channel, Some(expected));
            assert!(args.yes);
        }
        other => panic!("expected Update command, got {other:?}"),
    }
}

#[test]
fn prototype_channel_is_rejected() {
    let result = Cli::try_parse_from(["kfx-installer", "install", "--channel", "prototype"]);
    assert!(result.is_err());
}

#[rstest]
#[case::files_to_remove("files-to-remove")]
#[case::verify("verify")]
fn report_commands_accept_current_and_json(#[case] name: &str) {
    let cli = Cli::parse_from(["kfx-installer", name, "--current", "1.2.0", "--json"]);
    let args = match cli.command {
        Command::FilesToRemove(args) | Command::Verify(args) => args,
        other => panic!("expected report command, got {other:?}"),
    };
    assert_eq!(args.current.as_deref(), Some("1.2.0"));
    assert!(args.json);
}

#[rstest]
#[case::default(&[], LevelFilter::Info)]
#[case::verbose(&["-v"], LevelFilter::Debug)]
#[case::very_verbose(&["-vv"], LevelFilter::Trace)]
#[case::quiet(&["-q"], LevelFilter::Warn)]
fn verbosity_selects_log_filter(#[case] flags: &[&str], #[case] expected: LevelFilter) {
    let args = std::iter::once("kfx-installer")
        .chain(flags.iter().copied())
        .chain(std::iter::once("check"));
    let cli = Cli::parse_from(args);
    assert_eq!(cli.global.log_filter(), expected);
}

#[test]
fn quiet_conflicts_with_verbose() {
    let result = Cli::try_parse_from(["kfx-installer", "-q", "-v", "check"]);
    assert!(result.is_err());
}

#[test]
fn channel_argument_maps_to_release_channel() {
    assert_eq!(ReleaseChannel::from(ChannelArg::Alpha), ReleaseChannel::Alpha);
    assert_eq!(ReleaseChannel::from(ChannelArg::Stable), ReleaseChannel::Stable);
}
