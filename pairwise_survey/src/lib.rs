mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};

use std::collections::{BTreeMap, HashMap};

pub use crate::config::*;

/// One unordered combination of two distinct criteria.
///
/// The key is formed from the two identifiers in list order, so the pair
/// of `a` and `c` is always `"a_c"`, never `"c_a"`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Pair {
    pub first: CriterionId,
    pub second: CriterionId,
}

impl Pair {
    pub fn key(&self) -> String {
        format!("{}_{}", self.first, self.second)
    }
}

impl Judgment {
    /// Encodes the judgment into its compact token.
    ///
    /// The shape is fixed for compatibility with previously exported
    /// records: `"0"` for an equal judgment, otherwise the intensity
    /// immediately followed by the winning identifier (`"2c"`).
    pub fn encode(&self) -> String {
        match self {
            Judgment::Equal => "0".to_string(),
            Judgment::Prefer { winner, intensity } => format!("{}{}", intensity, winner),
        }
    }

    /// Parses a compact token back into a judgment.
    ///
    /// The intensity is only checked for being non-zero here; whether it
    /// fits a particular stage scale is decided when recording.
    pub fn decode(token: &str) -> Result<Judgment, SurveyErrors> {
        if token == "0" {
            return Ok(Judgment::Equal);
        }
        let invalid = || SurveyErrors::InvalidToken {
            token: token.to_string(),
        };
        let idx = token
            .find(|c: char| !c.is_ascii_digit())
            .filter(|idx| *idx > 0)
            .ok_or_else(|| invalid())?;
        let (digits, rest) = token.split_at(idx);
        let mut tail = rest.chars();
        match (digits.parse::<u8>(), tail.next(), tail.next()) {
            (Ok(intensity), Some(c), None) if intensity >= 1 => {
                let winner = CriterionId::new(c).map_err(|_| invalid())?;
                Ok(Judgment::Prefer { winner, intensity })
            }
            _ => Err(invalid()),
        }
    }
}

/// Enumerates every unordered pair of the given criteria, exactly once,
/// in the standard 2-combination order: for `[a,b,c,d]` the output is
/// `(a,b),(a,c),(a,d),(b,c),(b,d),(c,d)`.
///
/// Pure function: the same input always yields the same sequence. This
/// order is also the presentation order of the questionnaire. Fewer than
/// two criteria yield no pairs at all.
pub fn generate_pairs(criteria: &[Criterion]) -> Vec<Pair> {
    let n = criteria.len();
    let mut pairs: Vec<Pair> = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push(Pair {
                first: criteria[i].id,
                second: criteria[j].id,
            });
        }
    }
    pairs
}

// The walk-through state of one stage. The cursor lives in
// [0, pairs.len()]; sitting at pairs.len() means the sweep is over.
#[derive(Debug, Clone)]
struct StageState {
    stage: Stage,
    pairs: Vec<Pair>,
    key_index: HashMap<String, usize>,
    cursor: usize,
    responses: BTreeMap<String, String>,
}

impl StageState {
    fn new(stage: Stage) -> StageState {
        let pairs = generate_pairs(stage.criteria());
        let key_index = pairs
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.key(), idx))
            .collect();
        StageState {
            stage,
            pairs,
            key_index,
            cursor: 0,
            responses: BTreeMap::new(),
        }
    }

    fn is_complete(&self) -> bool {
        // The expected total is always derived from the criteria list.
        self.responses.len() == self.pairs.len()
    }
}

/// The in-memory state of one operator walking through one survey.
///
/// All operations are local and synchronous. The session never touches
/// I/O itself: exporting the record is the caller's concern, and the
/// `exported` flag only keeps an automatic export from firing twice for
/// the same completion event.
#[derive(Debug, Clone)]
pub struct SurveySession {
    operator: Operator,
    stages: Vec<StageState>,
    exported: bool,
}

impl SurveySession {
    pub(crate) fn assemble(
        operator: Operator,
        stages: Vec<Stage>,
    ) -> Result<SurveySession, SurveyErrors> {
        if stages.is_empty() {
            return Err(SurveyErrors::EmptySurvey);
        }
        for (idx, s) in stages.iter().enumerate() {
            if stages[..idx].iter().any(|o| o.id() == s.id()) {
                return Err(SurveyErrors::DuplicateStage {
                    stage: s.id().to_string(),
                });
            }
        }
        info!(
            "Survey session for {:?}: {} stages",
            operator.name,
            stages.len()
        );
        let states: Vec<StageState> = stages.into_iter().map(StageState::new).collect();
        for st in states.iter() {
            info!(
                "Stage {}: {} criteria, {} comparisons",
                st.stage.id(),
                st.stage.criteria().len(),
                st.pairs.len()
            );
        }
        Ok(SurveySession {
            operator,
            stages: states,
            exported: false,
        })
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// The stages in their configured order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().map(|s| &s.stage)
    }

    pub fn stage(&self, stage_id: &str) -> Result<&Stage, SurveyErrors> {
        self.state(stage_id).map(|s| &s.stage)
    }

    pub fn pairs(&self, stage_id: &str) -> Result<&[Pair], SurveyErrors> {
        self.state(stage_id).map(|s| s.pairs.as_slice())
    }

    pub fn pair_count(&self, stage_id: &str) -> Result<usize, SurveyErrors> {
        self.state(stage_id).map(|s| s.pairs.len())
    }

    pub fn cursor(&self, stage_id: &str) -> Result<usize, SurveyErrors> {
        self.state(stage_id).map(|s| s.cursor)
    }

    /// The pair under the cursor, or `None` once the sweep is over.
    pub fn current_pair(&self, stage_id: &str) -> Result<Option<&Pair>, SurveyErrors> {
        let state = self.state(stage_id)?;
        Ok(state.pairs.get(state.cursor))
    }

    /// Records the judgment for one pair of the stage, overwriting any
    /// previous answer for the same pair.
    ///
    /// A pair key outside the stage's pair set is a precondition
    /// violation and is rejected; no state is created for it. The
    /// intensity must fit the stage scale and the winner must be one of
    /// the two members of the pair.
    pub fn record_judgment(
        &mut self,
        stage_id: &str,
        pair_key: &str,
        judgment: &Judgment,
    ) -> Result<(), SurveyErrors> {
        let state = self.state_mut(stage_id)?;
        let idx = *state
            .key_index
            .get(pair_key)
            .ok_or_else(|| SurveyErrors::UnknownPair {
                stage: stage_id.to_string(),
                key: pair_key.to_string(),
            })?;
        let pair = state.pairs[idx];
        if let Judgment::Prefer { winner, intensity } = judgment {
            let max_level = state.stage.scale().max_level();
            if *intensity < 1 || *intensity > max_level {
                return Err(SurveyErrors::IntensityOutOfScale {
                    intensity: *intensity,
                    max_level,
                });
            }
            if *winner != pair.first && *winner != pair.second {
                return Err(SurveyErrors::ForeignWinner {
                    key: pair_key.to_string(),
                    winner: winner.as_char(),
                });
            }
        }
        let token = judgment.encode();
        debug!(
            "record_judgment: stage {} pair {} token {:?}",
            stage_id, pair_key, token
        );
        if state.responses.insert(pair_key.to_string(), token).is_some() {
            debug!("record_judgment: replaced previous answer for {}", pair_key);
        }
        assert!(
            state.responses.len() <= state.pairs.len(),
            "Responses outgrew the pair set of stage {}",
            stage_id
        );
        if state.is_complete() {
            info!(
                "Stage {} complete ({} comparisons)",
                stage_id,
                state.pairs.len()
            );
        }
        Ok(())
    }

    /// Records an already-encoded token after decoding it. This is the
    /// entry point for scripted answers.
    pub fn record_token(
        &mut self,
        stage_id: &str,
        pair_key: &str,
        token: &str,
    ) -> Result<(), SurveyErrors> {
        let judgment = Judgment::decode(token)?;
        self.record_judgment(stage_id, pair_key, &judgment)
    }

    /// Moves the cursor forward by one, clamped at the end of the stage.
    pub fn advance(&mut self, stage_id: &str) -> Result<(), SurveyErrors> {
        let state = self.state_mut(stage_id)?;
        if state.cursor < state.pairs.len() {
            state.cursor += 1;
        }
        Ok(())
    }

    /// Moves the cursor back by one; retreating below zero is a no-op.
    pub fn retreat(&mut self, stage_id: &str) -> Result<(), SurveyErrors> {
        let state = self.state_mut(stage_id)?;
        state.cursor = state.cursor.saturating_sub(1);
        Ok(())
    }

    pub fn is_stage_complete(&self, stage_id: &str) -> Result<bool, SurveyErrors> {
        self.state(stage_id).map(|s| s.is_complete())
    }

    /// True iff every configured stage has an answer for each of its
    /// pairs.
    pub fn is_complete(&self) -> bool {
        self.stages.iter().all(|s| s.is_complete())
    }

    /// The recorded tokens of one stage, keyed by pair.
    pub fn stage_responses(
        &self,
        stage_id: &str,
    ) -> Result<&BTreeMap<String, String>, SurveyErrors> {
        self.state(stage_id).map(|s| &s.responses)
    }

    pub fn stage_reports(&self) -> Vec<StageReport> {
        self.stages
            .iter()
            .map(|s| StageReport {
                stage_id: s.stage.id().to_string(),
                name: s.stage.name().to_string(),
                answered: s.responses.len(),
                pair_count: s.pairs.len(),
                complete: s.is_complete(),
            })
            .collect()
    }

    /// Whether the automatic export already ran for this session.
    pub fn exported(&self) -> bool {
        self.exported
    }

    pub fn mark_exported(&mut self) {
        self.exported = true;
    }

    fn state(&self, stage_id: &str) -> Result<&StageState, SurveyErrors> {
        self.stages
            .iter()
            .find(|s| s.stage.id() == stage_id)
            .ok_or_else(|| SurveyErrors::UnknownStage {
                stage: stage_id.to_string(),
            })
    }

    fn state_mut(&mut self, stage_id: &str) -> Result<&mut StageState, SurveyErrors> {
        self.stages
            .iter_mut()
            .find(|s| s.stage.id() == stage_id)
            .ok_or_else(|| SurveyErrors::UnknownStage {
                stage: stage_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::Builder;
    use crate::*;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn criteria(ids: &[char]) -> Vec<Criterion> {
        ids.iter()
            .map(|c| Criterion::new(*c, &format!("Criterion {}", c)).unwrap())
            .collect()
    }

    fn single_stage(ids: &[char], max_level: u8) -> SurveySession {
        let stage = Stage::new(
            "themes",
            "Theme priority",
            IntensityScale::new(max_level).unwrap(),
            &criteria(ids),
        )
        .unwrap();
        Builder::new("Ada Lovelace")
            .unwrap()
            .stage(&stage)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn pair_enumeration_order() {
        let pairs = generate_pairs(&criteria(&['a', 'b', 'c', 'd']));
        let keys: Vec<String> = pairs.iter().map(|p| p.key()).collect();
        assert_eq!(keys, vec!["a_b", "a_c", "a_d", "b_c", "b_d", "c_d"]);
    }

    #[test]
    fn pair_count_follows_criteria_count() {
        for n in 0..10 {
            let ids: Vec<char> = ('a'..).take(n).collect();
            let pairs = generate_pairs(&criteria(&ids));
            assert_eq!(pairs.len(), n * n.saturating_sub(1) / 2);
        }
    }

    #[test]
    fn degenerate_stages_are_trivially_complete() {
        let cases: [&[char]; 2] = [&[], &['a']];
        for ids in cases {
            let session = single_stage(ids, 3);
            assert_eq!(session.pair_count("themes").unwrap(), 0);
            assert!(session.is_stage_complete("themes").unwrap());
            assert!(session.is_complete());
            assert_eq!(session.current_pair("themes").unwrap(), None);
        }
    }

    #[test]
    fn token_encoding() {
        let b = CriterionId::new('b').unwrap();
        assert_eq!(Judgment::Equal.encode(), "0");
        assert_eq!(
            Judgment::Prefer {
                winner: b,
                intensity: 2
            }
            .encode(),
            "2b"
        );
    }

    #[test]
    fn token_decoding() {
        assert_eq!(Judgment::decode("0").unwrap(), Judgment::Equal);
        assert_eq!(
            Judgment::decode("5c").unwrap(),
            Judgment::Prefer {
                winner: CriterionId::new('c').unwrap(),
                intensity: 5
            }
        );
        for bad in ["", "3", "b", "0b", "2B", "2bc", "b2", "2_b"] {
            assert!(Judgment::decode(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn tokens_round_trip() {
        for intensity in 1..=5u8 {
            for winner in ['a', 'w'] {
                let j = Judgment::Prefer {
                    winner: CriterionId::new(winner).unwrap(),
                    intensity,
                };
                assert_eq!(Judgment::decode(&j.encode()).unwrap(), j);
            }
        }
    }

    #[test]
    fn recording_overwrites_and_never_grows_past_the_pair_set() {
        let mut session = single_stage(&['a', 'b', 'c'], 3);
        session.record_token("themes", "a_b", "2b").unwrap();
        session.record_token("themes", "a_b", "0").unwrap();
        let responses = session.stage_responses("themes").unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses.get("a_b"), Some(&"0".to_string()));
    }

    #[test]
    fn unknown_pairs_are_rejected() {
        let mut session = single_stage(&['a', 'b', 'c'], 3);
        let res = session.record_token("themes", "b_a", "2b");
        assert_eq!(
            res,
            Err(SurveyErrors::UnknownPair {
                stage: "themes".to_string(),
                key: "b_a".to_string()
            })
        );
        assert!(session.stage_responses("themes").unwrap().is_empty());
        assert!(matches!(
            session.record_token("nope", "a_b", "0"),
            Err(SurveyErrors::UnknownStage { .. })
        ));
    }

    #[test]
    fn judgments_outside_the_pair_or_scale_are_rejected() {
        let mut session = single_stage(&['a', 'b', 'c'], 3);
        assert_eq!(
            session.record_token("themes", "a_b", "2c"),
            Err(SurveyErrors::ForeignWinner {
                key: "a_b".to_string(),
                winner: 'c'
            })
        );
        assert_eq!(
            session.record_token("themes", "a_b", "4b"),
            Err(SurveyErrors::IntensityOutOfScale {
                intensity: 4,
                max_level: 3
            })
        );
    }

    #[test]
    fn completion_boundary() {
        let mut session = single_stage(&['a', 'b', 'c'], 3);
        session.record_token("themes", "a_b", "2b").unwrap();
        session.record_token("themes", "a_c", "0").unwrap();
        assert!(!session.is_stage_complete("themes").unwrap());
        assert!(!session.is_complete());
        session.record_token("themes", "b_c", "3c").unwrap();
        assert!(session.is_stage_complete("themes").unwrap());
        assert!(session.is_complete());
    }

    #[test]
    fn cursor_clamps_at_both_ends() {
        let mut session = single_stage(&['a', 'b', 'c'], 3);
        session.retreat("themes").unwrap();
        assert_eq!(session.cursor("themes").unwrap(), 0);
        for _ in 0..10 {
            session.advance("themes").unwrap();
        }
        assert_eq!(session.cursor("themes").unwrap(), 3);
        assert_eq!(session.current_pair("themes").unwrap(), None);
        session.retreat("themes").unwrap();
        assert_eq!(
            session.current_pair("themes").unwrap().map(|p| p.key()),
            Some("b_c".to_string())
        );
    }

    #[test]
    fn walkthrough_with_navigation() {
        init_logs();
        let mut session = single_stage(&['a', 'b', 'c'], 5);
        // Answer the first pair, then step back and change the verdict.
        let first = session.current_pair("themes").unwrap().unwrap().key();
        assert_eq!(first, "a_b");
        session.record_token("themes", &first, "1a").unwrap();
        session.advance("themes").unwrap();
        session.retreat("themes").unwrap();
        session.record_token("themes", "a_b", "2b").unwrap();
        session.advance("themes").unwrap();
        session.record_token("themes", "a_c", "0").unwrap();
        session.advance("themes").unwrap();
        session.record_token("themes", "b_c", "5c").unwrap();
        session.advance("themes").unwrap();
        assert_eq!(session.current_pair("themes").unwrap(), None);

        let responses = session.stage_responses("themes").unwrap();
        let flat: Vec<(&str, &str)> = responses
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(flat, vec![("a_b", "2b"), ("a_c", "0"), ("b_c", "5c")]);
        assert!(session.is_complete());
    }

    #[test]
    fn survey_completion_spans_all_stages() {
        init_logs();
        let s1 = Stage::new(
            "themes",
            "Theme priority",
            IntensityScale::new(3).unwrap(),
            &criteria(&['a', 'b']),
        )
        .unwrap();
        let s2 = Stage::new(
            "maturity",
            "Maturity",
            IntensityScale::new(5).unwrap(),
            &criteria(&['a', 'b', 'c']),
        )
        .unwrap();
        let mut session = Builder::new("Ada Lovelace")
            .unwrap()
            .stage(&s1)
            .unwrap()
            .stage(&s2)
            .unwrap()
            .build()
            .unwrap();

        session.record_token("themes", "a_b", "3a").unwrap();
        assert!(session.is_stage_complete("themes").unwrap());
        assert!(!session.is_complete());

        session.record_token("maturity", "a_b", "0").unwrap();
        session.record_token("maturity", "a_c", "4c").unwrap();
        session.record_token("maturity", "b_c", "0").unwrap();
        assert!(session.is_complete());
    }

    #[test]
    fn exported_flag_is_sticky() {
        let mut session = single_stage(&['a', 'b'], 3);
        assert!(!session.exported());
        session.mark_exported();
        session.mark_exported();
        assert!(session.exported());
    }
}
