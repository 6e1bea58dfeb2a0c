use super::*;

use avm_analysis::{PatternRegistry, ResponseContext, SentimentLexicon};
use avm_core::{BrandConfig, PlatformConfig};
use avm_sources::SourceSettings;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["avm"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_patterns_with_aliases() {
    let cli = Cli::try_parse_from([
        "avm",
        "patterns",
        "Acme Cloud",
        "--alias",
        "AC",
        "--alias",
        "acme.io",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Patterns { name, aliases }) => {
            assert_eq!(name, "Acme Cloud");
            assert_eq!(aliases, vec!["AC".to_string(), "acme.io".to_string()]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn analyze_requires_file() {
    assert!(Cli::try_parse_from(["avm", "analyze"]).is_err());
}

#[test]
fn analyze_defaults_platform_to_manual() {
    let cli = Cli::try_parse_from(["avm", "analyze", "--file", "answer.txt", "--topic", "crm"])
        .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Analyze {
            file,
            platform,
            topic,
            persona,
            prompt,
        }) => {
            assert_eq!(file, std::path::PathBuf::from("answer.txt"));
            assert_eq!(platform, "manual");
            assert_eq!(topic.as_deref(), Some("crm"));
            assert!(persona.is_none());
            assert!(prompt.is_empty());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parses_collect_dry_run() {
    let cli = Cli::try_parse_from(["avm", "collect", "--dry-run"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Collect {
            platform: None,
            dry_run: true
        })
    ));
}

#[test]
fn parses_collect_single_platform() {
    let cli = Cli::try_parse_from(["avm", "collect", "--platform", "perplexity"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Collect {
            platform: Some(ref p),
            dry_run: false
        }) if p == "perplexity"
    ));
}

#[test]
fn parses_aggregate() {
    let cli = Cli::try_parse_from(["avm", "aggregate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Aggregate)));
}

#[test]
fn report_defaults_to_overall_table() {
    let cli = Cli::try_parse_from(["avm", "report"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            scope: Scope::Overall,
            value: None,
            json: false
        })
    ));
}

#[test]
fn report_parses_scope_and_value() {
    let cli = Cli::try_parse_from([
        "avm", "report", "--scope", "platform", "--value", "openai", "--json",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            scope: Scope::Platform,
            value: Some(ref v),
            json: true
        }) if v == "openai"
    ));
}

#[test]
fn report_rejects_unknown_scope() {
    assert!(Cli::try_parse_from(["avm", "report", "--scope", "region"]).is_err());
}

// ---------------------------------------------------------------------------
// Handler helpers
// ---------------------------------------------------------------------------

fn platform(id: &str) -> PlatformConfig {
    PlatformConfig {
        id: id.to_string(),
        base_url: format!("https://{id}.example.com/v1"),
        model: "test-model".to_string(),
        api_key_env: None,
    }
}

#[test]
fn select_platforms_keeps_all_without_filter() {
    let selected =
        collect::select_platforms(vec![platform("openai"), platform("perplexity")], None)
            .expect("selection should succeed");
    assert_eq!(selected.len(), 2);
}

#[test]
fn select_platforms_narrows_to_one() {
    let selected = collect::select_platforms(
        vec![platform("openai"), platform("perplexity")],
        Some("perplexity"),
    )
    .expect("selection should succeed");
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].id, "perplexity");
}

#[test]
fn select_platforms_rejects_unknown_id() {
    let err = collect::select_platforms(vec![platform("openai")], Some("gemini"))
        .expect_err("unknown platform should fail");
    let message = err.to_string();
    assert!(message.contains("gemini"), "got: {message}");
    assert!(message.contains("openai"), "got: {message}");
}

#[test]
fn call_timeout_covers_every_attempt() {
    let settings = SourceSettings {
        request_timeout_secs: 30,
        max_retries: 2,
        retry_backoff_base_ms: 1000,
        ..SourceSettings::default()
    };
    let timeout = collect::call_timeout(&settings);
    assert!(timeout >= std::time::Duration::from_secs(90));
}

#[test]
fn call_timeout_saturates_on_huge_settings() {
    let settings = SourceSettings {
        request_timeout_secs: u64::MAX,
        max_retries: u32::MAX,
        retry_backoff_base_ms: u64::MAX,
        ..SourceSettings::default()
    };
    let timeout = collect::call_timeout(&settings);
    assert_eq!(timeout, std::time::Duration::MAX);
}

#[test]
fn resolve_scope_key_defaults_overall_to_all() {
    let key = report::resolve_scope_key(Scope::Overall, None).expect("overall has a default");
    assert_eq!(key.to_string(), "overall:all");
}

#[test]
fn resolve_scope_key_requires_value_for_partitions() {
    assert!(report::resolve_scope_key(Scope::Topic, None).is_err());
    let key = report::resolve_scope_key(Scope::Topic, Some("crm")).expect("value given");
    assert_eq!(key.to_string(), "topic:crm");
}

#[test]
fn analyzed_text_feeds_report_table() {
    let brands = vec![BrandConfig::own("Acme"), BrandConfig::competitor("Globex")];
    let registry = PatternRegistry::build(&brands);
    let lexicon = SentimentLexicon::default();

    let records: Vec<_> = [
        "Acme is a popular choice. Globex also comes up.",
        "Many teams pick Acme for reporting.",
    ]
    .iter()
    .map(|text| {
        let context = ResponseContext::new("openai", "best crm?").with_topic(Some("crm".into()));
        analyze::metrics_for_text(text, context, &registry, &lexicon)
    })
    .collect();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.mentions.len() == 2));
    assert_eq!(records[1].rank_for("Acme"), Some(1));
    assert_eq!(records[1].rank_for("Globex"), None);

    let partitions = avm_analysis::aggregate_all(&records, &brands);
    let overall = &partitions[&avm_core::ScopeKey::overall()];
    let table = report::format_report(&avm_core::ScopeKey::overall(), overall);

    assert!(table.starts_with("# Visibility report: overall:all"));
    assert!(table.contains("Responses in scope: 2"));
    assert!(table.contains("**Acme**"));
    assert!(table.contains("| Globex |"));
    let acme_row = table
        .lines()
        .position(|l| l.contains("**Acme**"))
        .expect("own brand row");
    let globex_row = table
        .lines()
        .position(|l| l.contains("| Globex |"))
        .expect("competitor row");
    assert!(acme_row < globex_row, "rows keep the given order");
}

#[test]
fn pattern_listing_includes_exact_name() {
    let set = avm_analysis::generate_patterns("Acme Cloud");
    let lines = patterns::format_patterns(&set);
    assert_eq!(lines.len(), set.len());
    assert!(lines.iter().any(|l| l.starts_with("Exact") && l.ends_with("Acme Cloud")));
}
