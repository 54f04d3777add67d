//! Built-in polling-unit anomaly rules

use super::Rule;
use crate::error::RuleFault;
use crate::types::record::field::*;
use crate::types::record::Record;

use super::Category::{AgentObserver, Procedural, Statistical, Turnout, VotingPattern};

fn ratio(numerator: f64, denominator: f64, what: &'static str) -> Result<f64, RuleFault> {
    if denominator == 0.0 {
        return Err(RuleFault::UndefinedArithmetic(what));
    }
    Ok(numerator / denominator)
}

fn last_digit(value: f64) -> f64 {
    value.rem_euclid(10.0)
}

fn is_multiple_of(value: f64, base: f64) -> bool {
    value.rem_euclid(base) == 0.0
}

fn major_party_votes(r: &Record) -> Result<[f64; 3], RuleFault> {
    Ok([r.number(PDP_VOTES)?, r.number(APC_VOTES)?, r.number(LP_VOTES)?])
}

fn max_major(r: &Record) -> Result<f64, RuleFault> {
    Ok(major_party_votes(r)?.into_iter().fold(f64::MIN, f64::max))
}

fn min_major(r: &Record) -> Result<f64, RuleFault> {
    Ok(major_party_votes(r)?.into_iter().fold(f64::MAX, f64::min))
}

pub(super) fn rules() -> Vec<Rule> {
    vec![
        // Turnout and registration
        Rule::new(Turnout, 1, 10, "Turnout exceeds 100% of registered voters.", |r| {
            Ok(r.number(VOTES_CAST)? > r.number(REGISTERED_VOTERS)?)
        }),
        Rule::new(Turnout, 2, 9, "Turnout is exactly 100% (highly improbable).", |r| {
            Ok(r.number(VOTES_CAST)? == r.number(REGISTERED_VOTERS)?
                && r.number(REGISTERED_VOTERS)? > 50.0)
        }),
        Rule::new(Turnout, 3, 8, "Turnout is suspiciously high (over 95%).", |r| {
            let registered = r.number(REGISTERED_VOTERS)?;
            if registered > 0.0 {
                Ok(r.number(VOTES_CAST)? / registered > 0.95)
            } else {
                Ok(false)
            }
        }),
        Rule::new(Turnout, 4, 5, "Turnout is suspiciously low (under 10%).", |r| {
            let registered = r.number(REGISTERED_VOTERS)?;
            if registered > 0.0 {
                Ok(r.number(VOTES_CAST)? / registered < 0.10)
            } else {
                Ok(false)
            }
        }),
        Rule::new(Turnout, 5, 6, "Turnout deviates more than 30% from historical average.", |r| {
            Ok((r.number(TURNOUT_PERCENTAGE)? - r.number(HISTORICAL_TURNOUT)?).abs() > 0.30)
        }),
        Rule::new(Turnout, 6, 8, "Number of accredited voters is less than total votes cast.", |r| {
            Ok(r.number(ACCREDITED_VOTERS)? < r.number(VOTES_CAST)?)
        }),
        Rule::new(
            Turnout,
            7,
            4,
            "Significant mismatch between registered voters and census population.",
            |r| Ok(r.number(REGISTERED_VOTERS)? > r.number(ESTIMATED_POPULATION)? * 0.8),
        ),
        Rule::new(Turnout, 8, 7, "Votes cast is zero, but registered voters > 0.", |r| {
            Ok(r.number(VOTES_CAST)? == 0.0 && r.number(REGISTERED_VOTERS)? > 0.0)
        }),
        // Voting and results patterns
        Rule::new(
            VotingPattern,
            1,
            9,
            "One party received over 98% of the vote (extreme lack of competition).",
            |r| {
                let cast = r.number(VOTES_CAST)?;
                if cast > 0.0 {
                    Ok(max_major(r)? / cast > 0.98)
                } else {
                    Ok(false)
                }
            },
        ),
        Rule::new(VotingPattern, 2, 7, "Total party votes do not sum to total valid votes cast.", |r| {
            let total = r.number(PDP_VOTES)?
                + r.number(APC_VOTES)?
                + r.number(LP_VOTES)?
                + r.number(OTHER_VOTES)?;
            Ok(total != r.number(VALID_VOTES)?)
        }),
        Rule::new(
            VotingPattern,
            3,
            6,
            "Number of invalid/spoiled votes is unusually high (>10% of cast votes).",
            |r| {
                let cast = r.number(VOTES_CAST)?;
                if cast > 0.0 {
                    Ok((cast - r.number(VALID_VOTES)?) / cast > 0.10)
                } else {
                    Ok(false)
                }
            },
        ),
        Rule::new(
            VotingPattern,
            4,
            5,
            "Vote counts for major parties are round numbers (e.g., 100, 250), suggesting fabrication.",
            |r| {
                Ok(is_multiple_of(r.number(PDP_VOTES)?, 10.0)
                    && is_multiple_of(r.number(APC_VOTES)?, 10.0)
                    && is_multiple_of(r.number(LP_VOTES)?, 10.0)
                    && r.number(VOTES_CAST)? > 50.0)
            },
        ),
        Rule::new(
            VotingPattern,
            5,
            8,
            "Results are a statistical outlier compared to neighboring polling units.",
            |r| Ok((r.number(UNIT_WIN_MARGIN)? - r.number(NEIGHBOR_AVG_WIN_MARGIN)?).abs() > 0.40),
        ),
        Rule::new(
            VotingPattern,
            6,
            7,
            "The number of 'other' party votes is larger than a major party's votes.",
            |r| Ok(r.number(OTHER_VOTES)? > min_major(r)? && r.number(VOTES_CAST)? > 100.0),
        ),
        Rule::new(VotingPattern, 7, 10, "Total valid votes exceeds total votes cast.", |r| {
            Ok(r.number(VALID_VOTES)? > r.number(VOTES_CAST)?)
        }),
        Rule::new(
            VotingPattern,
            8,
            7,
            "Winning margin is razor-thin (1 vote) in a high-turnout unit.",
            |r| Ok(r.number(WINNING_MARGIN_ABS)? == 1.0 && r.number(VOTES_CAST)? > 200.0),
        ),
        Rule::new(
            VotingPattern,
            9,
            6,
            "Vote distribution fails Benford's Law test for leading digits.",
            |r| r.flag(FAILS_BENFORDS_LAW),
        ),
        Rule::new(
            VotingPattern,
            10,
            5,
            "Results show a perfect split (e.g., 50/50) between two parties.",
            |r| {
                Ok(r.number(PDP_VOTES)? == r.number(APC_VOTES)?
                    && r.number(VOTES_CAST)? > 100.0
                    && r.number(LP_VOTES)? == 0.0)
            },
        ),
        Rule::new(VotingPattern, 11, 9, "A candidate receives more votes than registered voters.", |r| {
            Ok(max_major(r)? > r.number(REGISTERED_VOTERS)?)
        }),
        // Procedural and logistical
        Rule::new(
            Procedural,
            1,
            7,
            "Results were submitted significantly late (> 3 hours after polls closed).",
            |r| Ok(r.number(SUBMISSION_DELAY_HOURS)? > 3.0),
        ),
        Rule::new(
            Procedural,
            2,
            9,
            "Official results form (Form EC8A) is reported missing or altered.",
            |r| r.flag(FORM_EC8A_MISSING_OR_ALTERED),
        ),
        Rule::new(
            Procedural,
            3,
            6,
            "BVAS (Bimodal Voter Accreditation System) reported malfunctioning.",
            |r| r.flag(BVAS_MALFUNCTION),
        ),
        Rule::new(
            Procedural,
            4,
            8,
            "Reports of violence, voter intimidation, or coercion at the unit.",
            |r| r.flag(REPORTS_OF_VIOLENCE),
        ),
        Rule::new(Procedural, 5, 5, "Polling unit opened significantly late (> 2 hours).", |r| {
            Ok(r.number(OPENING_DELAY_HOURS)? > 2.0)
        }),
        Rule::new(Procedural, 6, 7, "Party agents were reportedly absent or chased away.", |r| {
            r.flag(PARTY_AGENTS_ABSENT)
        }),
        Rule::new(Procedural, 7, 8, "Ballot box snatching or stuffing reported.", |r| {
            r.flag(BALLOT_BOX_SNATCHING)
        }),
        Rule::new(Procedural, 8, 4, "Number of security personnel present was zero.", |r| {
            Ok(r.number(SECURITY_PERSONNEL_PRESENT)? == 0.0)
        }),
        Rule::new(
            Procedural,
            9,
            6,
            "Results not publicly posted at the polling unit as required.",
            |r| Ok(!r.flag(RESULTS_PUBLICLY_POSTED)?),
        ),
        Rule::new(Procedural, 10, 7, "Accreditation numbers manually altered on forms.", |r| {
            r.flag(MANUAL_ACCREDITATION_ALTERATION)
        }),
        // Agent and observer reports
        Rule::new(
            AgentObserver,
            1,
            7,
            "Multiple party agents refused to sign the results form.",
            |r| Ok(r.number(AGENTS_REFUSED_SIGNING)? > 1.0),
        ),
        Rule::new(
            AgentObserver,
            2,
            8,
            "Accredited domestic observers flagged the unit for irregularities.",
            |r| r.flag(OBSERVER_FLAGS_IRREGULARITY),
        ),
        Rule::new(AgentObserver, 3, 6, "Observer reports contradict official vote counts.", |r| {
            r.flag(OBSERVER_COUNTS_MISMATCH)
        }),
        Rule::new(
            AgentObserver,
            4,
            5,
            "No independent observers were present at the polling unit.",
            |r| Ok(!r.flag(OBSERVERS_PRESENT)?),
        ),
        Rule::new(
            AgentObserver,
            5,
            7,
            "Reports of vote buying heavily concentrated at this unit.",
            |r| r.flag(REPORTS_OF_VOTE_BUYING),
        ),
        // Statistical fingerprints
        Rule::new(
            Statistical,
            1,
            6,
            "The number of accredited voters is exactly equal to registered voters.",
            |r| {
                Ok(r.number(ACCREDITED_VOTERS)? == r.number(REGISTERED_VOTERS)?
                    && r.number(REGISTERED_VOTERS)? > 50.0)
            },
        ),
        Rule::new(
            Statistical,
            2,
            7,
            "The last digit of vote counts for all parties is identical and not zero.",
            |r| {
                let digit = last_digit(r.number(PDP_VOTES)?);
                Ok(digit == last_digit(r.number(APC_VOTES)?)
                    && digit == last_digit(r.number(LP_VOTES)?)
                    && digit != 0.0
                    && r.number(VOTES_CAST)? > 50.0)
            },
        ),
        Rule::new(
            Statistical,
            3,
            5,
            "Extremely low number of invalid votes (zero) in a high-turnout unit.",
            |r| {
                let cast = r.number(VOTES_CAST)?;
                Ok(cast - r.number(VALID_VOTES)? == 0.0 && cast > 300.0)
            },
        ),
        Rule::new(
            Statistical,
            4,
            8,
            "Turnout percentage is a perfect integer (e.g., 80.00%) in a large unit.",
            |r| {
                let registered = r.number(REGISTERED_VOTERS)?;
                if registered <= 200.0 {
                    return Ok(false);
                }
                let turnout = ratio(r.number(VOTES_CAST)?, registered, "turnout")?;
                Ok(turnout.fract() == 0.0)
            },
        ),
        Rule::new(
            Statistical,
            5,
            7,
            "One party wins by the exact same margin as in the previous election.",
            |r| {
                let margin = r.number(WINNING_MARGIN_ABS)?;
                Ok(margin == r.number(HISTORICAL_WIN_MARGIN_ABS)? && margin > 0.0)
            },
        ),
        Rule::new(Statistical, 6, 9, "Sum of votes cast is greater than the estimated population.", |r| {
            Ok(r.number(VOTES_CAST)? > r.number(ESTIMATED_POPULATION)?)
        }),
        Rule::new(Statistical, 7, 4, "One party received zero votes in a competitive area.", |r| {
            Ok(min_major(r)? == 0.0 && r.number(VOTES_CAST)? > 100.0)
        }),
        Rule::new(Statistical, 8, 8, "Accredited voters number is a round number (e.g., 500).", |r| {
            let accredited = r.number(ACCREDITED_VOTERS)?;
            Ok(is_multiple_of(accredited, 100.0) && accredited > 0.0)
        }),
        Rule::new(
            Statistical,
            9,
            7,
            "Number of registered voters is identical to a neighboring unit.",
            |r| Ok(r.number(REGISTERED_VOTERS)? == r.number(NEIGHBOR_REGISTERED_VOTERS)?),
        ),
        Rule::new(
            Statistical,
            10,
            6,
            "Vote counts are in perfect descending order (e.g., 300, 200, 100).",
            |r| {
                let [pdp, apc, lp] = major_party_votes(r)?;
                Ok(pdp > apc
                    && apc > lp
                    && is_multiple_of(pdp, 100.0)
                    && is_multiple_of(apc, 100.0)
                    && is_multiple_of(lp, 100.0))
            },
        ),
    ]
}
