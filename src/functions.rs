// Standard library
use std::error::Error;
use std::sync::Arc;

// 3rd party crates
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

// Project imports
use crate::api::{CrptApi, DispatchReport, Outcome};
use crate::models::{Description, Document, Product};
use crate::settings::ConfigManager;

/// Number of documents submitted by the demo run
pub const DEMO_DOCUMENTS: usize = 10;

/// Submits a batch of sample documents through the rate-limited client and
/// waits for their outcomes.
///
/// Stops early on the shutdown signal, discarding whatever is still queued.
pub async fn run(
    config: Arc<ConfigManager>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), Box<dyn Error>> {
    let settings = config.get_settings().await;
    let rate_limit = settings.get_rate_limit();
    info!(
        "Submitting up to {} documents every {} ms",
        rate_limit.max_requests, rate_limit.window_millis
    );

    let (api, mut reports) = CrptApi::new(
        settings.api.url.clone(),
        settings.api.timeout(),
        rate_limit,
    )?;
    let signature: String = settings.api.signature.clone();

    // Drop the settings lock
    drop(settings);

    let document = sample_document();
    for i in 1..=DEMO_DOCUMENTS {
        let mut document = document.clone();
        document.doc_id = i.to_string();
        api.create_document(document, signature.as_str());
    }

    let mut received: usize = 0;
    while received < DEMO_DOCUMENTS {
        tokio::select! {
            Ok(_) = shutdown_rx.recv() => {
                warn!(queued = api.queued(), "Received shutdown signal, abandoning queued documents");
                break;
            }

            report = reports.recv() => match report {
                Some(report) => {
                    received += 1;
                    log_report(&report);
                }
                None => break,
            },
        }
    }

    let metrics = api.metrics().await;
    info!(
        attempts = metrics.attempts,
        successes = metrics.successes,
        non_success = metrics.non_success_statuses,
        transport_failures = metrics.transport_failures,
        encoding_failures = metrics.encoding_failures,
        "Submission summary"
    );

    if received < DEMO_DOCUMENTS {
        api.shutdown().await;
    } else {
        api.finish().await;
    }

    Ok(())
}

fn log_report(report: &DispatchReport) {
    match &report.outcome {
        Outcome::Sent { body, .. } => {
            debug!(ticket = report.ticket, response = %body, "Document accepted");
        }
        Outcome::SendFailed(e) => {
            debug!(ticket = report.ticket, error = %e, "Document rejected");
        }
    }
}

/// Builds the sample document used by the demo run.
pub fn sample_document() -> Document {
    let product = Product {
        certificate_document: "testCert".into(),
        certificate_document_date: "2020-01-23".into(),
        certificate_document_number: "123".into(),
        owner_inn: "123456789".into(),
        producer_inn: "123456789".into(),
        production_date: "2020-01-23".into(),
        tnved_code: "testTnvedCode".into(),
        uit_code: "testUnitCode".into(),
        uitu_code: "testUituCode".into(),
    };

    Document {
        description: Description {
            participant_inn: "123456789".into(),
        },
        doc_id: "test".into(),
        doc_status: "testStatus".into(),
        doc_type: "testDocType".into(),
        import_request: true,
        owner_inn: "123456789".into(),
        participant_inn: "123456789".into(),
        producer_inn: "123456789".into(),
        production_date: "2020-01-23".into(),
        production_type: "testProductionType".into(),
        products: vec![product],
        reg_date: "2020-01-23".into(),
        reg_number: "123456789".into(),
    }
}
