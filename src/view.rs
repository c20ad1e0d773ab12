// src/view.rs
//! Per-page-view pipeline: dispatch every configured source adapter
//! concurrently, merge terminal outcomes into the score board as they
//! arrive, and recompute the composite after each merge.
//!
//! Adapters are fire-and-forget relative to each other. Each task races a
//! per-source timeout and the page view's cancellation token; a timeout or
//! transport error marks every outcome key the adapter declared as
//! `Errored` so the completion predicate can never starve. Cancelling the
//! token abandons in-flight work without recording outcomes.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::aggregate::{CompositeScore, ScoreBoard, SourceOutcome};
use crate::identity::TitleIdentity;
use crate::sources::{SourceAdapter, SourceReport};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "source_fetch_errors_total",
            "Adapter fetches ending in an Errored outcome (transport or timeout)."
        );
        describe_counter!(
            "composite_recomputes_total",
            "Composite score recomputations across all page views."
        );
        describe_histogram!("source_fetch_ms", "Adapter fetch time in milliseconds.");
    });
}

/// Aggregate ratings for one identity. Returns the final board; `on_change`
/// fires with the updated board and freshly recomputed composite after
/// every merged outcome, so callers can render progressively.
pub async fn aggregate_ratings(
    adapters: &[Arc<dyn SourceAdapter>],
    identity: &TitleIdentity,
    source_timeout: Duration,
    cancel: &CancellationToken,
    mut on_change: impl FnMut(&ScoreBoard, CompositeScore),
) -> ScoreBoard {
    ensure_metrics_described();

    let mut board = ScoreBoard::for_identity(identity);
    let mut tasks: JoinSet<Vec<SourceReport>> = JoinSet::new();

    for adapter in adapters {
        let declared = adapter.sources(identity);
        if declared.is_empty() {
            continue;
        }

        let adapter = Arc::clone(adapter);
        let identity = identity.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let started = std::time::Instant::now();
            let fetched = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(adapter = adapter.name(), "page view cancelled");
                    return Vec::new();
                }
                fetched = tokio::time::timeout(source_timeout, adapter.fetch(&identity)) => fetched,
            };
            histogram!("source_fetch_ms").record(started.elapsed().as_secs_f64() * 1_000.0);

            let errored = |reason: String| {
                counter!("source_fetch_errors_total").increment(1);
                tracing::warn!(adapter = adapter.name(), reason = %reason, "source errored");
                declared
                    .iter()
                    .map(|s| SourceReport::new(*s, SourceOutcome::Errored { reason: reason.clone() }))
                    .collect()
            };

            match fetched {
                Ok(Ok(reports)) => reports,
                Ok(Err(e)) => errored(format!("{e:#}")),
                Err(_) => errored(format!("timed out after {}ms", source_timeout.as_millis())),
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if cancel.is_cancelled() {
            tasks.abort_all();
            break;
        }
        let reports = match joined {
            Ok(reports) => reports,
            Err(e) => {
                // A panicked adapter task loses its outcomes; the board
                // keeps them Pending and the caller's deadline handles it.
                tracing::error!(error = %e, "adapter task failed to join");
                continue;
            }
        };
        if reports.is_empty() {
            continue;
        }

        for report in reports {
            board.record(report.source, report.outcome);
        }
        let composite = board.recompute();
        counter!("composite_recomputes_total").increment(1);
        tracing::debug!(
            value = ?composite.value,
            contributing = composite.contributing_count,
            complete = board.is_complete(),
            "composite recomputed"
        );
        on_change(&board, composite);
    }

    board
}
