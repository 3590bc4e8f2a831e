//! 需求解析协作方的接缝与有界重试。
//!
//! 解析方把自然语言需求转换为候选 JSON；候选未通过校验时，完整的违规文本会附加到下一次请求，
//! 直到成功或用尽尝试次数。

use std::cell::RefCell;
use std::collections::VecDeque;

use fplan_core::plan::FloorplanDocument;
use fplan_schema::FloorplanValidator;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::errors::{FrontendError, ParserError};

/// 描述输入契约的基础提示词。
pub const SCHEMA_PROMPT: &str = r#"Convert the user's architectural requirements into one JSON object with exactly these fields:

{
  "total_area": number (square meters, land_width * land_height),
  "land_width": number (meters, > 0),
  "land_height": number (meters, > 0),
  "floor_count": integer (>= 1, default 1),
  "rooms": [
    {
      "name": string (optional, e.g. "Master Bedroom"),
      "type": "bedroom" | "living_room" | "kitchen" | "bathroom" | "hall" | "stairs" | "office" | "gym" | "basement" | "terrace" | "balcony" | "other",
      "x": number (lower-left x in meters),
      "y": number (lower-left y in meters),
      "width": number (meters, > 0),
      "height": number (meters, > 0),
      "separate": boolean (default false),
      "openings": [
        {
          "type": "door" | "window",
          "wall": "north" | "south" | "east" | "west",
          "pos": number (offset along the wall, measured clockwise from the wall's starting corner),
          "width": number (optional, meters)
        }
      ]
    }
  ],
  "entrance": "north" | "south" | "east" | "west" (default "south"),
  "style": "Modern" | "Classic" (default "Modern"),
  "walls_thickness": number (meters, default 0.3),
  "notes": string (optional)
}

Rules:
- Every room lies inside [0, land_width] x [0, land_height].
- Rooms do not overlap.
- Every room has at least one door.
- Each room meets the minimum area for its type.
Return only the JSON object."#;

pub fn build_prompt(requirements: &str) -> String {
    format!("{SCHEMA_PROMPT}\n\nUser requirements:\n{requirements}")
}

/// 需求解析协作方：输入提示词，返回尚未校验的候选文档。
pub trait RequirementParser {
    fn parse(&self, prompt: &str) -> Result<Value, ParserError>;
}

/// 离线演示用的确定性解析方：10×10 地块上的三个 5×5 房间。
#[derive(Debug, Default, Clone, Copy)]
pub struct MockParser;

impl MockParser {
    pub fn layout() -> Value {
        json!({
            "total_area": 100.0,
            "land_width": 10.0,
            "land_height": 10.0,
            "floor_count": 1,
            "rooms": [
                {
                    "name": "Living Room", "type": "living_room",
                    "x": 0, "y": 0, "width": 5, "height": 5, "separate": false,
                    "openings": [
                        { "type": "door", "wall": "south", "pos": 2.0 },
                        { "type": "window", "wall": "west", "pos": 1.5 }
                    ]
                },
                {
                    "name": "Bedroom 1", "type": "bedroom",
                    "x": 5, "y": 0, "width": 5, "height": 5, "separate": true,
                    "openings": [
                        { "type": "door", "wall": "west", "pos": 1.5 },
                        { "type": "window", "wall": "east", "pos": 1.5 }
                    ]
                },
                {
                    "name": "Kitchen", "type": "kitchen",
                    "x": 0, "y": 5, "width": 5, "height": 5, "separate": false,
                    "openings": [
                        { "type": "door", "wall": "south", "pos": 2.0 },
                        { "type": "window", "wall": "north", "pos": 1.5 }
                    ]
                }
            ],
            "entrance": "south",
            "walls_thickness": 0.3,
            "notes": "Mock layout"
        })
    }
}

impl RequirementParser for MockParser {
    fn parse(&self, _prompt: &str) -> Result<Value, ParserError> {
        Ok(Self::layout())
    }
}

/// 按顺序返回预设响应，并记录收到的每个提示词。
#[derive(Debug, Default)]
pub struct ScriptedParser {
    responses: RefCell<VecDeque<Result<Value, String>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedParser {
    pub fn new(responses: impl IntoIterator<Item = Result<Value, String>>) -> Self {
        Self {
            responses: RefCell::new(responses.into_iter().collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl RequirementParser for ScriptedParser {
    fn parse(&self, prompt: &str) -> Result<Value, ParserError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(ParserError::Upstream(message)),
            None => Err(ParserError::ScriptExhausted),
        }
    }
}

/// 重试状态：当前是第几次尝试、下一次要发送的提示词、以及历次失败的完整文本。
#[derive(Debug, Clone)]
pub struct AttemptState {
    base_prompt: String,
    max_attempts: u32,
    attempt: u32,
    prompt: String,
    failures: Vec<String>,
}

impl AttemptState {
    pub fn new(base_prompt: String, max_attempts: u32) -> Self {
        Self {
            prompt: base_prompt.clone(),
            base_prompt,
            max_attempts: max_attempts.max(1),
            attempt: 0,
            failures: Vec::new(),
        }
    }

    #[inline]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[inline]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// 开始新一次尝试，返回本次要发送的提示词。
    pub fn begin(&mut self) -> &str {
        self.attempt += 1;
        &self.prompt
    }

    /// 记录失败，并把完整错误文本附加到下一次请求。
    pub fn record_failure(&mut self, error: String) {
        self.prompt = format!(
            "{}\n\nThe previous answer was rejected. Fix every one of these errors:\n{error}",
            self.base_prompt
        );
        self.failures.push(error);
    }

    fn last_failure(&self) -> String {
        self.failures.last().cloned().unwrap_or_default()
    }
}

/// 通过校验的文档及其消耗的尝试次数。
#[derive(Debug, Clone)]
pub struct SupervisedPlan {
    pub document: FloorplanDocument,
    pub attempts: u32,
}

pub struct RetrySupervisor {
    max_attempts: u32,
    validator: FloorplanValidator,
}

impl RetrySupervisor {
    /// `max_attempts` 为总尝试次数（首次 + 重试），至少为 1。
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            validator: FloorplanValidator::new(),
        }
    }

    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn run(
        &self,
        parser: &dyn RequirementParser,
        requirements: &str,
    ) -> Result<SupervisedPlan, FrontendError> {
        let mut state = AttemptState::new(build_prompt(requirements), self.max_attempts);
        while !state.is_exhausted() {
            let prompt = state.begin().to_string();
            let outcome = parser
                .parse(&prompt)
                .map_err(|err| err.to_string())
                .and_then(|candidate| {
                    self.validator
                        .validate_and_fill(candidate)
                        .map_err(|err| err.to_string())
                });
            match outcome {
                Ok(document) => {
                    info!(attempt = state.attempt(), rooms = document.rooms.len(), "需求解析成功");
                    return Ok(SupervisedPlan {
                        document,
                        attempts: state.attempt(),
                    });
                }
                Err(error) => {
                    warn!(
                        attempt = state.attempt(),
                        max_attempts = self.max_attempts,
                        error = %error,
                        "候选文档被拒绝"
                    );
                    state.record_failure(error);
                }
            }
        }
        Err(FrontendError::RetryExhausted {
            attempts: state.attempt(),
            last_error: state.last_failure(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doorless() -> Value {
        json!({
            "land_width": 10, "land_height": 10,
            "rooms": [{ "name": "Store", "type": "other", "x": 0, "y": 0, "width": 4, "height": 4 }]
        })
    }

    #[test]
    fn mock_layout_validates_on_first_attempt() {
        let plan = RetrySupervisor::new(3).run(&MockParser, "demo").expect("mock layout is valid");
        assert_eq!(plan.attempts, 1);
        assert_eq!(plan.document.rooms.len(), 3);
        assert!(plan.document.rooms.iter().all(|room| room.door_count() == 1));
    }

    #[test]
    fn rejected_candidate_feeds_full_error_into_next_prompt() {
        let parser = ScriptedParser::new([Ok(doorless()), Ok(MockParser::layout())]);
        let plan = RetrySupervisor::new(3).run(&parser, "one room").expect("second attempt succeeds");
        assert_eq!(plan.attempts, 2);

        let prompts = parser.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].ends_with("one room"));
        assert!(prompts[1].starts_with(&prompts[0]));
        assert!(prompts[1].contains("Store has no doors - it must be accessible."), "{}", prompts[1]);
    }

    #[test]
    fn exhaustion_reports_attempts_and_last_error() {
        let parser = ScriptedParser::new([Ok(doorless()), Err("timeout".to_string()), Ok(json!({}))]);
        let err = RetrySupervisor::new(3).run(&parser, "x").unwrap_err();
        match err {
            FrontendError::RetryExhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.starts_with("Schema errors:"), "{last_error}");
                assert!(last_error.contains("land_width"), "{last_error}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(parser.prompts().len(), 3);
        assert!(parser.prompts()[2].contains("需求解析服务调用失败: timeout"));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let supervisor = RetrySupervisor::new(0);
        assert_eq!(supervisor.max_attempts(), 1);
        let parser = ScriptedParser::new([]);
        let err = supervisor.run(&parser, "x").unwrap_err();
        assert!(matches!(err, FrontendError::RetryExhausted { attempts: 1, .. }));
    }

    #[test]
    fn attempt_state_keeps_only_latest_error_in_prompt() {
        let mut state = AttemptState::new("base".to_string(), 3);
        state.begin();
        state.record_failure("first".to_string());
        state.begin();
        state.record_failure("second".to_string());
        assert!(state.prompt().contains("second"));
        assert!(!state.prompt().contains("first"));
        assert_eq!(state.failures().len(), 2);
        assert!(!state.is_exhausted());
        state.begin();
        assert!(state.is_exhausted());
    }
}
