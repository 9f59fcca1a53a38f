//! `bsync verify`: offline completeness check of the local mirror.

use std::sync::Arc;

use anyhow::Result;

use bible_sync_core::verify::{CompletenessVerifier, VerifyReport, VerifyScope};

use crate::config::Config;
use crate::sqlite_store::SqliteCacheStore;

/// Returns `true` when the mirror is complete for the requested scope.
pub async fn run_verify(config: &Config, version: Option<String>, verbose: bool) -> Result<bool> {
    let store = Arc::new(SqliteCacheStore::open(config).await?);
    let scope = match version {
        Some(v) => VerifyScope::Version(v),
        None => VerifyScope::All,
    };

    let verifier = CompletenessVerifier::new(store.clone());
    let report = verifier.verify(&scope, verbose).await;
    store.close().await;
    let report = report?;

    print!("{}", render_report(&scope, &report, verbose));
    Ok(report.is_complete())
}

fn render_report(scope: &VerifyScope, report: &VerifyReport, verbose: bool) -> String {
    let label = match scope {
        VerifyScope::All => "all versions",
        VerifyScope::Version(v) => v.as_str(),
    };
    if report.is_complete() {
        return format!("{}: complete ({} chapters)\n", label, report.expected);
    }

    let mut out = format!("{}: incomplete\n", label);
    if verbose {
        out.push_str(&format!(
            "  present: {} / {} chapters\n",
            report.present, report.expected
        ));
        out.push_str(&format!("  missing: {}\n", report.missing.len()));
        for key in &report.missing {
            out.push_str(&format!("    {}\n", key));
        }
    } else if let Some(first) = report.missing.first() {
        out.push_str(&format!("  first missing: {}\n", first));
    }
    out
}
