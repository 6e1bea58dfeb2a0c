//! `patterns`: inspect what the matcher will look for.

use avm_analysis::{generate_patterns_with_aliases, BrandPatternSet};

pub(crate) fn format_patterns(set: &BrandPatternSet) -> Vec<String> {
    set.patterns()
        .iter()
        .map(|p| format!("{:<20}{}", format!("{:?}", p.kind), p.text))
        .collect()
}

pub(crate) fn run_patterns(name: &str, aliases: &[String]) {
    let set = generate_patterns_with_aliases(name, aliases);
    println!("{} patterns for \"{}\" (longest first):", set.len(), set.brand());
    println!("{:<20}TEXT", "KIND");
    for line in format_patterns(&set) {
        println!("{line}");
    }
}
