// service/scoring.rs
//
// Pure dispatch scoring. Lower score wins. The score is a rough minutes
// figure: a text-only travel estimate plus a fairness penalty that pushes
// work away from providers who already won jobs recently.
use std::cmp::Ordering;

use crate::config::MatchPolicy;
use crate::models::matchmodel::CandidateProvider;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub phone: String,
    pub landmark: String,
    pub eta_minutes: i32,
    pub penalty_minutes: i32,
    pub score: f64,
}

/// Travel estimate from two free-text landmarks inside the same village.
/// There is no geo data; proximity is judged by text overlap only, and an
/// unknown location gets the most pessimistic figure.
pub fn estimate_eta_minutes(
    customer_landmark: &str,
    provider_landmark: &str,
    policy: &MatchPolicy,
) -> i32 {
    let customer = customer_landmark.trim().to_lowercase();
    let provider = provider_landmark.trim().to_lowercase();

    if customer.is_empty() || provider.is_empty() {
        return policy.eta_unknown_minutes;
    }
    if customer == provider {
        return policy.eta_same_landmark_minutes;
    }
    // Shared leading word reads as the same named area ("Market Gate" vs
    // "Market Stalls").
    let customer_head = customer.split_whitespace().next();
    let provider_head = provider.split_whitespace().next();
    if customer_head.is_some() && customer_head == provider_head {
        return policy.eta_same_area_minutes;
    }
    policy.eta_same_village_minutes
}

pub fn fairness_penalty_minutes(recent_assignments: i64, policy: &MatchPolicy) -> i32 {
    let capped = recent_assignments.clamp(0, i32::MAX as i64) as i32;
    policy.penalty_per_assignment_minutes.saturating_mul(capped)
}

/// Rank candidates ascending by score, phone as the tie-break, truncated to
/// the offer cap. Deterministic for a fixed input set.
pub fn rank_candidates(
    customer_landmark: &str,
    candidates: Vec<(CandidateProvider, i64)>,
    policy: &MatchPolicy,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|(candidate, recent_assignments)| {
            let eta_minutes =
                estimate_eta_minutes(customer_landmark, &candidate.current_landmark, policy);
            let penalty_minutes = fairness_penalty_minutes(recent_assignments, policy);
            ScoredCandidate {
                phone: candidate.phone,
                landmark: candidate.current_landmark,
                eta_minutes,
                penalty_minutes,
                score: eta_minutes.saturating_add(penalty_minutes) as f64,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.phone.cmp(&b.phone))
    });
    scored.truncate(policy.offer_cap);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> MatchPolicy {
        MatchPolicy::default()
    }

    fn candidate(phone: &str, landmark: &str) -> CandidateProvider {
        CandidateProvider {
            phone: phone.to_string(),
            current_landmark: landmark.to_string(),
        }
    }

    #[test]
    fn eta_prefers_closer_text_matches() {
        let p = policy();
        let same = estimate_eta_minutes("Market Gate", "market gate", &p);
        let area = estimate_eta_minutes("Market Gate", "Market Stalls", &p);
        let village = estimate_eta_minutes("Market Gate", "Water Pump", &p);
        let unknown = estimate_eta_minutes("Market Gate", "", &p);
        assert_eq!(same, 2);
        assert_eq!(area, 5);
        assert_eq!(village, 9);
        assert_eq!(unknown, 12);
        assert!(same < area && area < village && village < unknown);
    }

    #[test]
    fn penalty_grows_with_recent_assignments() {
        let p = policy();
        assert_eq!(fairness_penalty_minutes(0, &p), 0);
        assert_eq!(fairness_penalty_minutes(3, &p), 6);
        assert!(fairness_penalty_minutes(-1, &p) == 0);
    }

    #[test]
    fn no_candidates_ranks_to_nothing() {
        let ranked = rank_candidates("Market Gate", Vec::new(), &policy());
        assert!(ranked.is_empty());
    }

    #[test]
    fn closer_idle_provider_outranks_farther_one() {
        // Both idle: one at the customer's landmark, one across the village.
        let ranked = rank_candidates(
            "Market Gate",
            vec![
                (candidate("+254700000001", "Water Pump"), 0),
                (candidate("+254700000002", "Market Gate"), 0),
            ],
            &policy(),
        );
        assert_eq!(ranked[0].phone, "+254700000002");
        assert_eq!(ranked[0].score, 2.0);
        assert_eq!(ranked[1].phone, "+254700000001");
        assert_eq!(ranked[1].score, 9.0);
    }

    #[test]
    fn busier_provider_at_same_landmark_loses_to_idle_neighbor() {
        let p = policy();
        // At the customer's landmark but with 2 recent jobs: 2 + 4 = 6.
        // One named area over with none: 5 + 0 = 5.
        let ranked = rank_candidates(
            "Market Gate",
            vec![
                (candidate("+254700000001", "Market Gate"), 2),
                (candidate("+254700000002", "Market Stalls"), 0),
            ],
            &p,
        );
        assert_eq!(ranked[0].phone, "+254700000002");
        assert_eq!(ranked[0].score, 5.0);
        assert_eq!(ranked[1].score, 6.0);
    }

    #[test]
    fn ties_break_by_phone() {
        let p = policy();
        let ranked = rank_candidates(
            "Water Pump",
            vec![
                (candidate("+254700000009", "Water Pump"), 0),
                (candidate("+254700000001", "Water Pump"), 0),
            ],
            &p,
        );
        assert_eq!(ranked[0].phone, "+254700000001");
        assert_eq!(ranked[1].phone, "+254700000009");
    }

    #[test]
    fn ranking_truncates_to_offer_cap() {
        let p = policy();
        let candidates = (0..8)
            .map(|i| (candidate(&format!("+25470000000{i}"), "Stage"), 0))
            .collect();
        let ranked = rank_candidates("Stage", candidates, &p);
        assert_eq!(ranked.len(), p.offer_cap);
    }

    #[test]
    fn ranking_is_deterministic() {
        let p = policy();
        let build = || {
            rank_candidates(
                "Posta",
                vec![
                    (candidate("+254700000003", "Posta"), 1),
                    (candidate("+254700000001", "Chief Camp"), 0),
                    (candidate("+254700000002", ""), 0),
                ],
                &p,
            )
        };
        assert_eq!(build(), build());
    }
}
