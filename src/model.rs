use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subject {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "deserialize_grade_lax")]
    pub grade: i64,
}

impl Subject {
    pub fn new(name: &str, grade: i64) -> Self {
        Self {
            name: name.to_string(),
            grade,
        }
    }
}

/// A student record. `avg_grade` is stored, and only refreshed by
/// `EntityStore::save_student`; imported or seeded values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Student {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub group: String,
    #[serde(deserialize_with = "null_as_default")]
    pub avg_grade: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub subjects: Vec<Subject>,
}

impl Student {
    pub fn blank(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleItem {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub day: String,
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(deserialize_with = "null_as_default")]
    pub teacher: String,
    #[serde(deserialize_with = "null_as_default")]
    pub homework: String,
}

impl ScheduleItem {
    pub fn blank(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// `null` reads as the field's empty value, same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => {
            warn!("null field in record, using empty value");
            Ok(T::default())
        }
        v => T::deserialize(v).map_err(serde::de::Error::custom),
    }
}

/// Grades are whole numbers; a fractional one is rounded half away from zero
/// and `null` reads as 0. Anything else is rejected.
fn deserialize_grade_lax<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => {
            warn!("null grade, using 0");
            Ok(0)
        }
        Value::Number(n) => {
            if let Some(g) = n.as_i64() {
                return Ok(g);
            }
            let f = n.as_f64().unwrap_or_default();
            // `as` saturates at the i64 bounds.
            let g = f.round() as i64;
            warn!(raw = f, rounded = g, "non-integer grade rounded");
            Ok(g)
        }
        other => Err(serde::de::Error::custom(format!(
            "expected a number or null for grade, got {other}"
        ))),
    }
}

/// Anything stored in a collection keyed by an integer id.
pub trait Record {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

impl Record for Student {
    fn id(&self) -> i64 {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

impl Record for ScheduleItem {
    fn id(&self) -> i64 {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// `max(0, ids...) + 1`. Ids of deleted records are only reused once nothing
/// larger remains. `None` once the largest id is `i64::MAX`.
pub fn next_id<R: Record>(records: &[R]) -> Option<i64> {
    records.iter().map(Record::id).fold(0, i64::max).checked_add(1)
}

pub fn seed_students() -> Vec<Student> {
    vec![
        Student {
            id: 1,
            name: "Александра Иванова".into(),
            group: "КБ-101".into(),
            avg_grade: 4.8,
            subjects: vec![
                Subject::new("Кибербезопасность", 5),
                Subject::new("Программирование", 5),
                Subject::new("Сети", 4),
            ],
        },
        Student {
            id: 2,
            name: "Дмитрий Петров".into(),
            group: "КБ-101".into(),
            avg_grade: 4.2,
            subjects: vec![
                Subject::new("Кибербезопасность", 4),
                Subject::new("Программирование", 5),
                Subject::new("Сети", 4),
            ],
        },
        Student {
            id: 3,
            name: "Мария Сидорова".into(),
            group: "КБ-102".into(),
            avg_grade: 4.5,
            subjects: vec![
                Subject::new("Кибербезопасность", 5),
                Subject::new("Программирование", 4),
                Subject::new("Сети", 5),
            ],
        },
    ]
}

pub fn seed_schedule() -> Vec<ScheduleItem> {
    let item = |id, day: &str, time: &str, subject: &str, teacher: &str, homework: &str| {
        ScheduleItem {
            id,
            day: day.into(),
            time: time.into(),
            subject: subject.into(),
            teacher: teacher.into(),
            homework: homework.into(),
        }
    };
    vec![
        item(
            1,
            "Понедельник",
            "09:00",
            "Кибербезопасность",
            "Смирнов А.В.",
            "Изучить основы шифрования",
        ),
        item(
            2,
            "Понедельник",
            "11:00",
            "Программирование",
            "Козлова М.И.",
            "Решить задачи на Python",
        ),
        item(
            3,
            "Среда",
            "10:00",
            "Сети",
            "Новиков И.П.",
            "Настроить виртуальную сеть",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_id_starts_at_one_and_skips_gaps() {
        let empty: Vec<Student> = Vec::new();
        assert_eq!(next_id(&empty), Some(1));

        let mut students = seed_students();
        assert_eq!(next_id(&students), Some(4));
        students.retain(|s| s.id != 2);
        assert_eq!(next_id(&students), Some(4));
        students.retain(|s| s.id != 3);
        assert_eq!(next_id(&students), Some(2));
    }

    #[test]
    fn next_id_runs_out_at_max() {
        let students = vec![Student::blank(i64::MAX)];
        assert_eq!(next_id(&students), None);
        let students = vec![Student::blank(i64::MAX - 1)];
        assert_eq!(next_id(&students), Some(i64::MAX));
    }

    #[test]
    fn student_wire_shape_uses_camel_case() {
        let v = serde_json::to_value(&seed_students()[0]).expect("serialize");
        assert_eq!(v["avgGrade"], serde_json::json!(4.8));
        assert_eq!(v["subjects"][2]["name"], "Сети");
        assert!(v.get("avg_grade").is_none());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let s: Student = serde_json::from_str(r#"{"id": 7, "name": "Only Name"}"#).expect("parse");
        assert_eq!(s.id, 7);
        assert_eq!(s.group, "");
        assert_eq!(s.avg_grade, 0.0);
        assert!(s.subjects.is_empty());

        let item: ScheduleItem = serde_json::from_str(r#"{"day": "Вторник"}"#).expect("parse");
        assert_eq!(item.id, 0);
        assert_eq!(item.day, "Вторник");
    }

    #[test]
    fn null_fields_read_as_empty() {
        let s: Student = serde_json::from_str(
            r#"{"id": null, "name": null, "group": "G", "avgGrade": null, "subjects": null}"#,
        )
        .expect("parse");
        assert_eq!(s, Student { group: "G".into(), ..Student::default() });

        let item: ScheduleItem =
            serde_json::from_str(r#"{"id": 2, "teacher": null}"#).expect("parse");
        assert_eq!(item.id, 2);
        assert_eq!(item.teacher, "");
    }

    #[test]
    fn grades_accept_fractions_and_null() {
        let subjects: Vec<Subject> = serde_json::from_str(
            r#"[{"name":"A","grade":4.5},{"name":"B","grade":3.49},{"name":"C","grade":null},{"name":"D","grade":5},{"name":"E","grade":1e300}]"#,
        )
        .expect("parse");
        let grades: Vec<i64> = subjects.iter().map(|s| s.grade).collect();
        assert_eq!(grades, vec![5, 3, 0, 5, i64::MAX]);

        let err = serde_json::from_str::<Subject>(r#"{"name":"A","grade":"five"}"#);
        assert!(err.is_err());
    }
}
