use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::player::Player;

/// Named predicates a conditional tile can branch on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    IsMarried,
    HasChildren,
    JobIs(String),
}

impl Condition {
    pub fn holds(&self, player: &Player) -> bool {
        match self {
            Condition::IsMarried => player.is_married(),
            Condition::HasChildren => player.has_children(),
            Condition::JobIs(job) => player.job() == Some(job.as_str()),
        }
    }
}

/// Player attributes other than money, as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKey {
    #[serde(rename = "isMarried")]
    Married,
    #[serde(rename = "children")]
    Children,
    #[serde(rename = "job")]
    Job,
}

impl StatusKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKey::Married => "isMarried",
            StatusKey::Children => "children",
            StatusKey::Job => "job",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Married(bool),
    Children(u32),
    Job(Option<String>),
}

impl StatusChange {
    /// Builds a typed change from the `{status, value}` pair of a board record.
    pub fn from_config(key: StatusKey, value: &Value) -> Result<Self, String> {
        match key {
            StatusKey::Married => value
                .as_bool()
                .map(StatusChange::Married)
                .ok_or_else(|| format!("isMarried expects a boolean, got {value}")),
            StatusKey::Children => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(StatusChange::Children)
                .ok_or_else(|| format!("children expects a non-negative integer, got {value}")),
            StatusKey::Job => match value {
                Value::Null => Ok(StatusChange::Job(None)),
                Value::String(job) if !job.is_empty() => Ok(StatusChange::Job(Some(job.clone()))),
                other => Err(format!("job expects a non-empty string or null, got {other}")),
            },
        }
    }

    pub fn key(&self) -> StatusKey {
        match self {
            StatusChange::Married(_) => StatusKey::Married,
            StatusChange::Children(_) => StatusKey::Children,
            StatusChange::Job(_) => StatusKey::Job,
        }
    }

    pub fn value(&self) -> Value {
        match self {
            StatusChange::Married(married) => Value::Bool(*married),
            StatusChange::Children(children) => Value::from(*children),
            StatusChange::Job(job) => job.clone().map(Value::String).unwrap_or(Value::Null),
        }
    }

    pub(crate) fn apply(&self, player: &mut Player) {
        match self {
            StatusChange::Married(married) => player.set_married(*married),
            StatusChange::Children(children) => player.set_children(*children),
            StatusChange::Job(job) => player.set_job(job.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_wire_format() {
        let married: Condition = serde_json::from_value(json!("isMarried")).unwrap();
        assert_eq!(married, Condition::IsMarried);
        let job: Condition = serde_json::from_value(json!({"jobIs": "professor"})).unwrap();
        assert_eq!(job, Condition::JobIs("professor".to_string()));
        assert!(serde_json::from_value::<Condition>(json!("isRich")).is_err());
    }

    #[test]
    fn test_condition_holds() {
        let mut player = Player::new("p", 1, 0);
        assert!(!Condition::IsMarried.holds(&player));
        player.set_married(true);
        player.set_children(2);
        player.set_job(Some("professor".to_string()));
        assert!(Condition::IsMarried.holds(&player));
        assert!(Condition::HasChildren.holds(&player));
        assert!(Condition::JobIs("professor".to_string()).holds(&player));
        assert!(!Condition::JobIs("lecturer".to_string()).holds(&player));
    }

    #[test]
    fn test_status_change_from_config() {
        assert_eq!(
            StatusChange::from_config(StatusKey::Married, &json!(true)),
            Ok(StatusChange::Married(true))
        );
        assert_eq!(
            StatusChange::from_config(StatusKey::Children, &json!(3)),
            Ok(StatusChange::Children(3))
        );
        assert_eq!(
            StatusChange::from_config(StatusKey::Job, &json!(null)),
            Ok(StatusChange::Job(None))
        );
        assert!(StatusChange::from_config(StatusKey::Children, &json!(-1)).is_err());
        assert!(StatusChange::from_config(StatusKey::Married, &json!("yes")).is_err());
        assert!(StatusChange::from_config(StatusKey::Job, &json!("")).is_err());
    }

    #[test]
    fn test_status_change_apply() {
        let mut player = Player::new("p", 1, 0);
        StatusChange::Children(2).apply(&mut player);
        StatusChange::Job(Some("lecturer".to_string())).apply(&mut player);
        assert_eq!(player.children(), 2);
        assert_eq!(player.job(), Some("lecturer"));
        assert_eq!(StatusChange::Children(2).value(), json!(2));
    }
}
