use serde_json::Value;

use crate::models::question::{Choice, Question, QuestionBody};
use crate::models::wire::{BodySubmission, ChoiceSubmission, ErrorDescriptor, QuestionSubmission};

pub const MIN_TIME_LIMIT: i64 = 60;
pub const MAX_TIME_LIMIT: i64 = 300;
pub const MIN_TOTAL_POINTS: i64 = 100;
pub const MAX_TOTAL_POINTS: i64 = 1000;

/// Turns a raw client submission into a question, or the full list of
/// `{field, value}` rejections. Checks are applied together and
/// collected; only a missing body cuts the body checks short.
pub fn parse_question(submission: &QuestionSubmission) -> Result<Question, Vec<ErrorDescriptor>> {
    let mut errors = Vec::new();

    let text = match submission.text.as_deref() {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        Some(text) => {
            errors.push(ErrorDescriptor::new("text", text));
            None
        }
        None => {
            errors.push(ErrorDescriptor::new("text", Value::Null));
            None
        }
    };

    let time_limit = match submission.time_limit {
        Some(limit) if (MIN_TIME_LIMIT..=MAX_TIME_LIMIT).contains(&limit) => Some(limit as u64),
        Some(limit) => {
            errors.push(ErrorDescriptor::new("timeLimit", limit));
            None
        }
        None => {
            errors.push(ErrorDescriptor::new("timeLimit", Value::Null));
            None
        }
    };

    let Some(body_submission) = &submission.body else {
        errors.push(ErrorDescriptor::new("question", Value::Null));
        return Err(errors);
    };
    let body = parse_body(body_submission, &mut errors);

    match (text, body, time_limit) {
        (Some(text), Some(body), Some(limit)) if errors.is_empty() => {
            Ok(Question::new(text, body, limit))
        }
        _ => Err(errors),
    }
}

fn parse_body(body: &BodySubmission, errors: &mut Vec<ErrorDescriptor>) -> Option<QuestionBody> {
    match body.kind.as_deref() {
        Some("multiple-choice") => parse_multiple_choice(body, errors),
        Some("fill-in") => parse_fill_in(body, errors),
        Some(other) => {
            errors.push(ErrorDescriptor::new("question", other));
            None
        }
        None => {
            errors.push(ErrorDescriptor::new("question", Value::Null));
            None
        }
    }
}

fn parse_multiple_choice(
    body: &BodySubmission,
    errors: &mut Vec<ErrorDescriptor>,
) -> Option<QuestionBody> {
    let choices = match &body.choices {
        Some(choices) if (2..=4).contains(&choices.len()) => {
            parse_entries("choices", choices, errors)
        }
        Some(choices) => {
            errors.push(ErrorDescriptor::new("choices", choices.len()));
            None
        }
        None => {
            errors.push(ErrorDescriptor::new("choices", Value::Null));
            None
        }
    };

    let answer = match (body.answer, &body.choices) {
        (Some(answer), Some(choices)) if (0..choices.len() as i64).contains(&answer) => {
            Some(answer as usize)
        }
        (Some(answer), _) => {
            errors.push(ErrorDescriptor::new("answer", answer));
            None
        }
        (None, _) => {
            errors.push(ErrorDescriptor::new("answer", Value::Null));
            None
        }
    };

    let choices = check_total_points(choices, errors)?;
    Some(QuestionBody::MultipleChoice {
        choices,
        answer: answer?,
    })
}

fn parse_fill_in(body: &BodySubmission, errors: &mut Vec<ErrorDescriptor>) -> Option<QuestionBody> {
    let answers = match &body.answers {
        Some(answers) if (1..=3).contains(&answers.len()) => {
            parse_entries("answers", answers, errors)
        }
        Some(answers) => {
            errors.push(ErrorDescriptor::new("answers", answers.len()));
            None
        }
        None => {
            errors.push(ErrorDescriptor::new("answers", Value::Null));
            None
        }
    };

    let answers = check_total_points(answers, errors)?;
    Some(QuestionBody::FillIn { answers })
}

/// Per-entry validation for a choices/answers list. Every offending
/// entry is reported positionally.
fn parse_entries(
    field: &str,
    entries: &[ChoiceSubmission],
    errors: &mut Vec<ErrorDescriptor>,
) -> Option<Vec<Choice>> {
    let mut parsed = Vec::with_capacity(entries.len());
    let before = errors.len();

    for (index, entry) in entries.iter().enumerate() {
        let text = match entry.text.as_deref() {
            Some(text) if !text.is_empty() => Some(text.to_string()),
            Some(text) => {
                errors.push(ErrorDescriptor::nested(field, index, "text", text));
                None
            }
            None => {
                errors.push(ErrorDescriptor::nested(field, index, "text", Value::Null));
                None
            }
        };

        let points = match entry.points {
            Some(points) if points >= 0 => Some(points as u32),
            Some(points) => {
                errors.push(ErrorDescriptor::nested(field, index, "points", points));
                None
            }
            None => {
                errors.push(ErrorDescriptor::nested(field, index, "points", Value::Null));
                None
            }
        };

        if let (Some(text), Some(points)) = (text, points) {
            parsed.push(Choice { text, points });
        }
    }

    (errors.len() == before).then_some(parsed)
}

fn check_total_points(
    entries: Option<Vec<Choice>>,
    errors: &mut Vec<ErrorDescriptor>,
) -> Option<Vec<Choice>> {
    let entries = entries?;
    let total: i64 = entries.iter().map(|entry| i64::from(entry.points)).sum();
    if !(MIN_TOTAL_POINTS..=MAX_TOTAL_POINTS).contains(&total) {
        errors.push(ErrorDescriptor::new("totalPoints", total));
        return None;
    }
    Some(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(value: Value) -> QuestionSubmission {
        serde_json::from_value(value).unwrap()
    }

    fn multiple_choice(time_limit: i64, num_choices: usize, answer: i64) -> QuestionSubmission {
        let choices: Vec<Value> = (0..num_choices)
            .map(|i| json!({"text": format!("c{i}"), "points": 200}))
            .collect();
        submission(json!({
            "text": "Q",
            "timeLimit": time_limit,
            "body": {"kind": "multiple-choice", "choices": choices, "answer": answer},
        }))
    }

    fn fill_in(num_answers: usize, points: i64) -> QuestionSubmission {
        let answers: Vec<Value> = (0..num_answers)
            .map(|i| json!({"text": format!("a{i}"), "points": points}))
            .collect();
        submission(json!({
            "text": "Q",
            "timeLimit": 60,
            "body": {"kind": "fill-in", "answers": answers},
        }))
    }

    fn fields(errors: Vec<ErrorDescriptor>) -> Vec<String> {
        errors.into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn accepts_a_complete_multiple_choice_submission() {
        let question = parse_question(&multiple_choice(60, 2, 1)).unwrap();
        assert_eq!(question.text, "Q");
        assert_eq!(question.time_limit, 60);
        assert_eq!(question.total_points, 400);
    }

    #[test]
    fn time_limit_boundaries_are_sixty_and_three_hundred() {
        assert!(parse_question(&multiple_choice(60, 2, 0)).is_ok());
        assert!(parse_question(&multiple_choice(300, 2, 0)).is_ok());

        let errors = parse_question(&multiple_choice(59, 2, 0)).unwrap_err();
        assert_eq!(errors, vec![ErrorDescriptor::new("timeLimit", 59)]);
        assert!(parse_question(&multiple_choice(301, 2, 0)).is_err());
    }

    #[test]
    fn choice_count_must_be_two_to_four() {
        assert!(parse_question(&multiple_choice(60, 2, 0)).is_ok());
        assert!(parse_question(&multiple_choice(60, 3, 0)).is_ok());
        assert!(parse_question(&multiple_choice(60, 4, 0)).is_ok());
        assert_eq!(
            parse_question(&multiple_choice(60, 1, 0)).unwrap_err(),
            vec![ErrorDescriptor::new("choices", 1)]
        );
        assert!(parse_question(&multiple_choice(60, 5, 0)).is_err());
    }

    #[test]
    fn answer_must_point_at_a_choice() {
        assert!(parse_question(&multiple_choice(60, 2, 2)).is_err());
        assert!(parse_question(&multiple_choice(60, 2, -1)).is_err());
    }

    #[test]
    fn fill_in_answer_count_must_be_one_to_three() {
        assert!(parse_question(&fill_in(1, 100)).is_ok());
        assert!(parse_question(&fill_in(3, 100)).is_ok());
        assert_eq!(
            parse_question(&fill_in(0, 100)).unwrap_err(),
            vec![ErrorDescriptor::new("answers", 0)]
        );
        assert!(parse_question(&fill_in(4, 100)).is_err());
    }

    #[test]
    fn total_points_must_be_between_one_hundred_and_one_thousand() {
        assert!(parse_question(&fill_in(1, 100)).is_ok());
        assert!(parse_question(&fill_in(1, 1000)).is_ok());
        assert_eq!(
            parse_question(&fill_in(1, 99)).unwrap_err(),
            vec![ErrorDescriptor::new("totalPoints", 99)]
        );
        assert_eq!(
            parse_question(&fill_in(2, 550)).unwrap_err(),
            vec![ErrorDescriptor::new("totalPoints", 1100)]
        );
    }

    #[test]
    fn entry_errors_are_reported_positionally() {
        let errors = parse_question(&submission(json!({
            "text": "Q",
            "timeLimit": 60,
            "body": {
                "kind": "multiple-choice",
                "choices": [
                    {"text": "ok", "points": 100},
                    {"text": "", "points": -5},
                ],
                "answer": 0,
            },
        })))
        .unwrap_err();

        assert_eq!(
            errors,
            vec![
                ErrorDescriptor::nested("choices", 1, "text", ""),
                ErrorDescriptor::nested("choices", 1, "points", -5),
            ]
        );
    }

    #[test]
    fn failures_are_collected_not_short_circuited() {
        let errors = parse_question(&submission(json!({
            "text": "",
            "timeLimit": 30,
            "body": {"kind": "multiple-choice", "choices": [], "answer": 0},
        })))
        .unwrap_err();

        assert_eq!(fields(errors), vec!["text", "timeLimit", "choices", "answer"]);
    }

    #[test]
    fn missing_body_still_reports_text_and_time_limit() {
        let errors = parse_question(&submission(json!({}))).unwrap_err();
        assert_eq!(fields(errors), vec!["text", "timeLimit", "question"]);
    }

    #[test]
    fn unknown_body_kind_is_rejected() {
        let errors = parse_question(&submission(json!({
            "text": "Q",
            "timeLimit": 60,
            "body": {"kind": "essay"},
        })))
        .unwrap_err();
        assert_eq!(errors, vec![ErrorDescriptor::new("question", "essay")]);
    }
}
