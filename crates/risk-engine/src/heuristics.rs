//! Pure scoring functions over stored event history (spec §4.E). Each
//! profile recompute is a deterministic fold over the target's own events;
//! no mutable state is threaded through besides what's passed in.

use chrono::{DateTime, Utc};
use dgc_types::ledger_event::LedgerEvent;
use dgc_types::listing::{ListingAuditEvent, ListingAuditType};
use dgc_types::risk::{clamp_score, CertificateRiskProfile, ListingRiskProfile, RiskLevel, RiskReason};
use dgc_types::time::now_iso;

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn within(now: DateTime<Utc>, ts: DateTime<Utc>, hours: i64) -> bool {
    now.signed_duration_since(ts).num_hours() < hours && ts <= now
}

pub fn score_certificate(
    cert_id: &str,
    events: &[LedgerEvent],
    cancellations_touching_cert: &[ListingAuditEvent],
    now: DateTime<Utc>,
) -> CertificateRiskProfile {
    let mut reasons = Vec::new();

    let mut transfers: Vec<(DateTime<Utc>, &str, &str)> = events
        .iter()
        .filter_map(|e| match e {
            LedgerEvent::Transfer { occurred_at, from, to, .. } => Some((parse_ts(occurred_at), from.as_str(), to.as_str())),
            _ => None,
        })
        .collect();
    transfers.sort_by_key(|(ts, _, _)| *ts);

    let transfers_24h = transfers.iter().filter(|(ts, _, _)| within(now, *ts, 24)).count();
    if transfers_24h >= 5 {
        reasons.push(RiskReason {
            code: "TRANSFER_VELOCITY_CRITICAL".to_string(),
            score_impact: 40,
            message: format!("{transfers_24h} transfers in the last 24 hours"),
            evidence: None,
        });
    } else if transfers_24h >= 3 {
        reasons.push(RiskReason {
            code: "TRANSFER_VELOCITY_ELEVATED".to_string(),
            score_impact: 25,
            message: format!("{transfers_24h} transfers in the last 24 hours"),
            evidence: None,
        });
    }

    let mut wash_loop = false;
    'outer: for i in 0..transfers.len() {
        for j in (i + 1)..transfers.len() {
            let (ts_i, from_i, to_i) = transfers[i];
            let (ts_j, from_j, to_j) = transfers[j];
            if ts_j.signed_duration_since(ts_i).num_hours() <= 48 && from_i == to_j && to_i == from_j {
                wash_loop = true;
                break 'outer;
            }
        }
    }
    if wash_loop {
        reasons.push(RiskReason {
            code: "WASH_LOOP_PATTERN".to_string(),
            score_impact: 30,
            message: "two transfers within 48h reverse each other's direction".to_string(),
            evidence: None,
        });
    }

    let cancellations_7d = cancellations_touching_cert
        .iter()
        .filter(|e| within(now, parse_ts(&e.occurred_at), 24 * 7))
        .count();
    if cancellations_7d >= 4 {
        reasons.push(RiskReason {
            code: "CANCELLATION_PRESSURE_CRITICAL".to_string(),
            score_impact: 35,
            message: format!("{cancellations_7d} listing cancellations touching this certificate in 7 days"),
            evidence: None,
        });
    } else if cancellations_7d >= 2 {
        reasons.push(RiskReason {
            code: "CANCELLATION_PRESSURE_ELEVATED".to_string(),
            score_impact: 20,
            message: format!("{cancellations_7d} listing cancellations touching this certificate in 7 days"),
            evidence: None,
        });
    }

    let score = clamp_score(reasons.iter().map(|r| r.score_impact).sum());
    CertificateRiskProfile {
        target: cert_id.to_string(),
        score,
        level: RiskLevel::from_score(score),
        reasons,
        updated_at: now_iso(),
        cert_id: Some(cert_id.to_string()),
    }
}

pub fn score_listing(listing_id: &str, cert_id: Option<&str>, audit: &[ListingAuditEvent], all_audit: &[ListingAuditEvent], now: DateTime<Utc>) -> ListingRiskProfile {
    let mut reasons = Vec::new();

    let locked_count = audit.iter().filter(|e| e.event_type == ListingAuditType::Locked).count();
    let cancelled_events: Vec<&ListingAuditEvent> = audit.iter().filter(|e| e.event_type == ListingAuditType::Cancelled).collect();

    if locked_count >= 1 && !cancelled_events.is_empty() {
        reasons.push(RiskReason {
            code: "LOCK_CANCEL_PATTERN".to_string(),
            score_impact: 35,
            message: "listing was locked and later cancelled".to_string(),
            evidence: None,
        });
    }
    if locked_count >= 2 {
        reasons.push(RiskReason {
            code: "MULTIPLE_LOCK_ATTEMPTS".to_string(),
            score_impact: 15,
            message: format!("{locked_count} lock attempts on this listing"),
            evidence: None,
        });
    }

    let latest_cancelled = cancelled_events.iter().max_by_key(|e| parse_ts(&e.occurred_at));
    if let Some(latest) = latest_cancelled {
        let is_timeout = latest
            .details
            .as_ref()
            .and_then(|d| d.get("reason"))
            .and_then(|v| v.as_str())
            .map(|r| r == "buyer_timeout")
            .unwrap_or(false);
        if is_timeout {
            reasons.push(RiskReason {
                code: "BUYER_TIMEOUT_SIGNAL".to_string(),
                score_impact: 10,
                message: "latest cancellation carries a buyer_timeout reason".to_string(),
                evidence: None,
            });
        }

        if let Some(actor) = latest.actor.as_deref() {
            let actor_cancellations_7d = all_audit
                .iter()
                .filter(|e| e.event_type == ListingAuditType::Cancelled && e.actor.as_deref() == Some(actor) && within(now, parse_ts(&e.occurred_at), 24 * 7))
                .count();
            if actor_cancellations_7d >= 3 {
                reasons.push(RiskReason {
                    code: "ACTOR_REPEAT_CANCELLATION".to_string(),
                    score_impact: 30,
                    message: format!("actor {actor} has {actor_cancellations_7d} cancellations in 7 days"),
                    evidence: None,
                });
            }
        }
    }

    let score = clamp_score(reasons.iter().map(|r| r.score_impact).sum());
    ListingRiskProfile {
        target: listing_id.to_string(),
        score,
        level: RiskLevel::from_score(score),
        reasons,
        updated_at: now_iso(),
        cert_id: cert_id.map(|s| s.to_string()),
    }
}
