use crate::prelude::*;

pub mod prelude {
    pub use super::{
        TasksetFileType,
        TasksetIoError,
        parse_taskset,
        load_invocations,
        synthesize_invocations,
    };
}

#[derive(Debug)]
#[derive(Clone, Copy)]
#[derive(PartialEq, Eq)]
#[derive(clap::ValueEnum)]
pub enum TasksetFileType {
    Auto,
    Json,
    Plain,
}

#[derive(Debug)]
pub enum TasksetIoError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    ParseError(String),
    TooManyTasks(usize),
    InvocationCapacity { task: usize, needed: u64 },
}

/// Read a task set from a file.
///
/// The plain format is a whitespace-separated stream: the task count first,
/// then four integers (phase, period, deadline, wcet, in milliseconds) per
/// task. The JSON format is an array of objects with the same four fields.
pub fn parse_taskset(taskset: &str, typ: TasksetFileType) -> Result<Vec<Task>, TasksetIoError> {
    use TasksetFileType::*;

    let path = std::path::Path::new(taskset);
    let typ =
        if typ == Auto {
            match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => Json,
                _ => Plain,
            }
        } else { typ };

    let taskset_data = std::fs::read_to_string(path)?;

    let taskset = match typ {
        Auto => unreachable!("auto format resolved above"),
        Json => json_deserialize_taskset(&taskset_data)?,
        Plain => plain_deserialize_taskset(&taskset_data)?,
    };

    validate_taskset(&taskset)?;

    Ok(taskset)
}

#[derive(serde::Serialize, serde::Deserialize)]
struct TaskSpec {
    phase: Time,
    period: Time,
    deadline: Time,
    wcet: Time,
}

fn json_deserialize_taskset(data: &str) -> Result<Vec<Task>, TasksetIoError> {
    let specs: Vec<TaskSpec> = serde_json::from_str(data)?;

    Ok(specs.into_iter()
        .enumerate()
        .map(|(id, spec)| Task::new_ms(
            id,
            spec.phase.as_millis(),
            spec.period.as_millis(),
            spec.deadline.as_millis(),
            spec.wcet.as_millis(),
        ))
        .collect())
}

fn plain_deserialize_taskset(data: &str) -> Result<Vec<Task>, TasksetIoError> {
    let mut tokens = data.split_ascii_whitespace();

    let num_tasks: usize = next_int(&mut tokens, "task count")? as usize;

    (0..num_tasks)
        .map(|id| {
            let phase = next_int(&mut tokens, "phase")?;
            let period = next_int(&mut tokens, "period")?;
            let deadline = next_int(&mut tokens, "deadline")?;
            let wcet = next_int(&mut tokens, "wcet")?;

            Ok(Task::new_ms(id, phase, period, deadline, wcet))
        })
        .collect()
}

fn next_int<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    field: &str
) -> Result<u64, TasksetIoError> {
    let token = tokens.next()
        .ok_or_else(|| TasksetIoError::ParseError(format!("Missing field '{field}'")))?;

    token.parse()
        .map_err(|err| TasksetIoError::ParseError(format!("Failed to parse field '{field}': {err}")))
}

fn validate_taskset(taskset: &[Task]) -> Result<(), TasksetIoError> {
    if taskset.len() > MAX_TASKS {
        return Err(TasksetIoError::TooManyTasks(taskset.len()));
    }

    for task in taskset {
        if task.period == Time::zero() {
            return Err(TasksetIoError::ParseError(
                format!("Task {}: period must be positive", task.id)
            ));
        }
        if task.wcet == Time::zero() || task.wcet > task.deadline {
            return Err(TasksetIoError::ParseError(
                format!("Task {}: wcet must be in (0, deadline]", task.id)
            ));
        }
        if !task.has_constrained_deadline() {
            return Err(TasksetIoError::ParseError(
                format!("Task {}: deadline must not exceed period", task.id)
            ));
        }
    }

    Ok(())
}

/// Read per-task invocation traces from a file.
///
/// The format is, for each task in id order, the invocation count followed
/// by that many execution times. A record cut short by end of input keeps
/// the values read so far; tasks past the cut keep an empty trace (their
/// jobs fall back to the wcet).
pub fn load_invocations(path: &str, taskset: &mut [Task]) -> Result<(), TasksetIoError> {
    let data = std::fs::read_to_string(path)?;
    let mut tokens = data.split_ascii_whitespace();

    for task in taskset.iter_mut() {
        let Some(count_token) = tokens.next() else {
            tracing::warn!(task = task.id, "invocation record missing, using wcet");
            continue;
        };

        let count: u64 = count_token.parse()
            .map_err(|err| TasksetIoError::ParseError(
                format!("Task {}: invalid invocation count: {err}", task.id)
            ))?;

        if count > MAX_JOBS_PER_TASK as u64 {
            return Err(TasksetIoError::InvocationCapacity { task: task.id, needed: count });
        }

        let mut invocations = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let Some(token) = tokens.next() else {
                tracing::warn!(
                    task = task.id,
                    expected = count,
                    read = invocations.len(),
                    "invocation record cut short, keeping the values read"
                );
                break;
            };

            let value: u64 = token.parse()
                .map_err(|err| TasksetIoError::ParseError(
                    format!("Task {}: invalid invocation time: {err}", task.id)
                ))?;
            invocations.push(Time::millis(value));
        }

        task.set_invocations(invocations);
    }

    Ok(())
}

/// Generate invocation traces covering one hyperperiod: task 0 alternates
/// execution times of 2 and 1 ms, every other task runs for a constant 1 ms.
pub fn synthesize_invocations(
    taskset: &mut [Task],
    hyperperiod: Time
) -> Result<(), TasksetIoError> {
    for task in taskset.iter_mut() {
        let releases = TaskUtils::releases_in_hyperperiod(task, hyperperiod);
        if releases > MAX_JOBS_PER_TASK as u64 {
            return Err(TasksetIoError::InvocationCapacity { task: task.id, needed: releases });
        }

        tracing::info!(task = task.id, count = releases, "auto-generating invocations");

        let invocations = (0..releases)
            .map(|j| {
                if task.id == 0 {
                    Time::millis(if j % 2 == 0 { 2 } else { 1 })
                } else {
                    Time::millis(1)
                }
            })
            .collect();

        task.set_invocations(invocations);
    }

    Ok(())
}

// =============================================================================

impl std::fmt::Display for TasksetIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Taskset IO Error, ")?;
        match self {
            TasksetIoError::IoError(error) => write!(f, "IO: {error}")?,
            TasksetIoError::JsonError(error) => write!(f, "JSON: {error}")?,
            TasksetIoError::ParseError(error) => write!(f, "Parse: {error}")?,
            TasksetIoError::TooManyTasks(count) =>
                write!(f, "task count {count} exceeds the bound of {MAX_TASKS}")?,
            TasksetIoError::InvocationCapacity { task, needed } =>
                write!(f, "task {task} needs {needed} invocations, capacity is {MAX_JOBS_PER_TASK}")?,
        };

        Ok(())
    }
}

impl std::error::Error for TasksetIoError {}

impl From<std::io::Error> for TasksetIoError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value)
    }
}

impl From<serde_json::Error> for TasksetIoError {
    fn from(value: serde_json::Error) -> Self {
        Self::JsonError(value)
    }
}

// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_parse(data: &str) -> Result<Vec<Task>, TasksetIoError> {
        let taskset = plain_deserialize_taskset(data)?;
        validate_taskset(&taskset)?;
        Ok(taskset)
    }

    #[test]
    fn plain_format_roundtrip() {
        let taskset = plain_parse("2\n0 4 4 1\n0 6 6 2\n").unwrap();

        assert_eq!(taskset.len(), 2);
        assert_eq!(taskset[0].period, Time::millis(4));
        assert_eq!(taskset[1].wcet, Time::millis(2));
        assert_eq!(taskset[1].id, 1);
    }

    #[test]
    fn plain_format_rejects_truncated_record() {
        assert!(matches!(
            plain_parse("2\n0 4 4 1\n0 6"),
            Err(TasksetIoError::ParseError(_))
        ));
    }

    #[test]
    fn rejects_unconstrained_deadline() {
        assert!(matches!(
            plain_parse("1\n0 4 8 1\n"),
            Err(TasksetIoError::ParseError(_))
        ));
    }

    #[test]
    fn rejects_too_many_tasks() {
        let mut data = String::from("11\n");
        for _ in 0..11 {
            data.push_str("0 4 4 1\n");
        }

        assert!(matches!(
            plain_parse(&data),
            Err(TasksetIoError::TooManyTasks(11))
        ));
    }

    #[test]
    fn json_format_accepts_unit_suffixes() {
        let data = r#"[
            { "phase": "0", "period": "10 ms", "deadline": "10 ms", "wcet": "5" },
            { "phase": "0", "period": "1 s", "deadline": "1 s", "wcet": "100 ms" }
        ]"#;

        let taskset = json_deserialize_taskset(data).unwrap();

        assert_eq!(taskset[0].period, Time::millis(10));
        assert_eq!(taskset[1].period, Time::secs(1));
        assert_eq!(taskset[1].wcet, Time::millis(100));
    }

    #[test]
    fn synthesis_covers_the_hyperperiod() {
        let mut taskset = vec![
            Task::new_ms(0, 0, 4, 4, 2),
            Task::new_ms(1, 0, 6, 6, 2),
        ];
        let hyperperiod = TaskUtils::hyperperiod(&taskset);

        synthesize_invocations(&mut taskset, hyperperiod).unwrap();

        assert_eq!(taskset[0].invocations().len(), 3);
        assert_eq!(taskset[1].invocations().len(), 2);
        assert_eq!(taskset[0].invocations()[0], Time::millis(2));
        assert_eq!(taskset[0].invocations()[1], Time::millis(1));
        assert_eq!(taskset[1].invocations()[0], Time::millis(1));
    }

    #[test]
    fn synthesis_rejects_overlong_traces() {
        let mut taskset = vec![
            Task::new_ms(0, 0, 1, 1, 1),
            Task::new_ms(1, 0, 600, 600, 1),
        ];
        let hyperperiod = TaskUtils::hyperperiod(&taskset);

        assert!(matches!(
            synthesize_invocations(&mut taskset, hyperperiod),
            Err(TasksetIoError::InvocationCapacity { task: 0, .. })
        ));
    }
}
