use crate::model::{self, next_id, Record, ScheduleItem, Student};
use crate::stats;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const STUDENTS_SLOT: &str = "cyberschool_students";
pub const SCHEDULE_SLOT: &str = "cyberschool_schedule";

/// Key-value medium holding one serialized collection per slot.
pub trait SlotStorage {
    fn read_slot(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write_slot(&mut self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Writes several slots as one unit. Media that can't commit atomically
    /// fall back to writing them in order.
    fn write_slots(&mut self, entries: &[(&'static str, String)]) -> anyhow::Result<()> {
        for (key, value) in entries {
            self.write_slot(key, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read slot {slot}: {message}")]
    Load { slot: String, message: String },
    #[error("failed to persist slot {slot}: {message}")]
    Persist { slot: String, message: String },
    #[error("no id left to assign in {collection}")]
    IdsExhausted { collection: &'static str },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Load { .. } => "load_failed",
            StoreError::Persist { .. } => "persist_failed",
            StoreError::IdsExhausted { .. } => "ids_exhausted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub id: i64,
    pub created: bool,
    /// False when an update named an id that is not in the collection.
    pub matched: bool,
}

pub struct EntityStore {
    slots: Box<dyn SlotStorage>,
    students: Vec<Student>,
    schedule: Vec<ScheduleItem>,
    student_draft: Option<Student>,
    schedule_draft: Option<ScheduleItem>,
}

impl EntityStore {
    /// Reads both slots, falling back to the default seed for any slot that
    /// is absent, empty or unreadable as a collection.
    pub fn load(slots: Box<dyn SlotStorage>) -> Result<Self, StoreError> {
        let students = load_collection(slots.as_ref(), STUDENTS_SLOT, model::seed_students)?;
        let schedule = load_collection(slots.as_ref(), SCHEDULE_SLOT, model::seed_schedule)?;
        info!(
            students = students.len(),
            schedule = schedule.len(),
            "store loaded"
        );
        Ok(Self {
            slots,
            students,
            schedule,
            student_draft: None,
            schedule_draft: None,
        })
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn schedule(&self) -> &[ScheduleItem] {
        &self.schedule
    }

    pub fn student_draft(&self) -> Option<&Student> {
        self.student_draft.as_ref()
    }

    pub fn schedule_draft(&self) -> Option<&ScheduleItem> {
        self.schedule_draft.as_ref()
    }

    /// Starts an add: the id is fixed here, before the record is filled in.
    pub fn begin_new_student(&mut self) -> Result<&Student, StoreError> {
        let id = fresh_id(&self.students, STUDENTS_SLOT)?;
        Ok(self.student_draft.insert(Student::blank(id)))
    }

    pub fn begin_edit_student(&mut self, id: i64) -> Option<&Student> {
        let found = self.students.iter().find(|s| s.id == id)?.clone();
        Some(self.student_draft.insert(found))
    }

    pub fn cancel_student_edit(&mut self) {
        self.student_draft = None;
    }

    pub fn begin_new_schedule(&mut self) -> Result<&ScheduleItem, StoreError> {
        let id = fresh_id(&self.schedule, SCHEDULE_SLOT)?;
        Ok(self.schedule_draft.insert(ScheduleItem::blank(id)))
    }

    pub fn begin_edit_schedule(&mut self, id: i64) -> Option<&ScheduleItem> {
        let found = self.schedule.iter().find(|s| s.id == id)?.clone();
        Some(self.schedule_draft.insert(found))
    }

    pub fn cancel_schedule_edit(&mut self) {
        self.schedule_draft = None;
    }

    pub fn save_student(
        &mut self,
        mut record: Student,
        is_new: bool,
    ) -> Result<SaveOutcome, StoreError> {
        record.avg_grade = stats::average_grade(&record.subjects);
        let outcome = upsert(&mut self.students, record, is_new, STUDENTS_SLOT)?;
        self.student_draft = None;
        debug!(
            id = outcome.id,
            created = outcome.created,
            matched = outcome.matched,
            "student saved"
        );
        self.persist_students()?;
        Ok(outcome)
    }

    /// Returns whether a record was removed; a missing id is not an error.
    pub fn delete_student(&mut self, id: i64) -> Result<bool, StoreError> {
        if !remove(&mut self.students, id) {
            return Ok(false);
        }
        debug!(id, "student deleted");
        self.persist_students()?;
        Ok(true)
    }

    pub fn save_schedule(
        &mut self,
        record: ScheduleItem,
        is_new: bool,
    ) -> Result<SaveOutcome, StoreError> {
        let outcome = upsert(&mut self.schedule, record, is_new, SCHEDULE_SLOT)?;
        self.schedule_draft = None;
        debug!(
            id = outcome.id,
            created = outcome.created,
            matched = outcome.matched,
            "schedule item saved"
        );
        self.persist_schedule()?;
        Ok(outcome)
    }

    pub fn delete_schedule(&mut self, id: i64) -> Result<bool, StoreError> {
        if !remove(&mut self.schedule, id) {
            return Ok(false);
        }
        debug!(id, "schedule item deleted");
        self.persist_schedule()?;
        Ok(true)
    }

    /// Wholesale replacement, bypassing per-record CRUD. `None` leaves that
    /// collection alone. Both slots are written in one batch, so the medium
    /// never holds one collection from before and one from after.
    pub fn replace_collections(
        &mut self,
        students: Option<Vec<Student>>,
        schedule: Option<Vec<ScheduleItem>>,
    ) -> Result<(), StoreError> {
        let mut writes = Vec::new();
        if let Some(students) = students.as_deref() {
            if let Some(text) = encode(STUDENTS_SLOT, students)? {
                writes.push((STUDENTS_SLOT, text));
            }
        }
        if let Some(schedule) = schedule.as_deref() {
            if let Some(text) = encode(SCHEDULE_SLOT, schedule)? {
                writes.push((SCHEDULE_SLOT, text));
            }
        }
        if !writes.is_empty() {
            self.slots
                .write_slots(&writes)
                .map_err(|e| StoreError::Persist {
                    slot: writes
                        .iter()
                        .map(|(k, _)| *k)
                        .collect::<Vec<_>>()
                        .join(", "),
                    message: format!("{e:#}"),
                })?;
        }
        // Memory follows storage only once the batch has landed.
        if let Some(students) = students {
            self.students = students;
        }
        if let Some(schedule) = schedule {
            self.schedule = schedule;
        }
        Ok(())
    }

    fn persist_students(&mut self) -> Result<bool, StoreError> {
        persist(self.slots.as_mut(), STUDENTS_SLOT, &self.students)
    }

    fn persist_schedule(&mut self) -> Result<bool, StoreError> {
        persist(self.slots.as_mut(), SCHEDULE_SLOT, &self.schedule)
    }
}

fn load_collection<T: DeserializeOwned>(
    slots: &dyn SlotStorage,
    slot: &'static str,
    seed: fn() -> Vec<T>,
) -> Result<Vec<T>, StoreError> {
    let text = slots.read_slot(slot).map_err(|e| StoreError::Load {
        slot: slot.to_string(),
        message: format!("{e:#}"),
    })?;
    let Some(text) = text else {
        debug!(slot, "slot absent, using seed");
        return Ok(seed());
    };
    match serde_json::from_str::<Vec<T>>(&text) {
        Ok(records) if !records.is_empty() => Ok(records),
        Ok(_) => {
            debug!(slot, "slot empty, using seed");
            Ok(seed())
        }
        Err(e) => {
            warn!(slot, error = %e, "slot content unreadable, using seed");
            Ok(seed())
        }
    }
}

/// Serialized slot text, or `None` for an empty collection: an empty
/// collection is never written, it would clobber persisted data with the
/// not-yet-loaded state.
fn encode<T: Serialize>(slot: &'static str, records: &[T]) -> Result<Option<String>, StoreError> {
    if records.is_empty() {
        debug!(slot, "skipping persist of empty collection");
        return Ok(None);
    }
    serde_json::to_string(records)
        .map(Some)
        .map_err(|e| StoreError::Persist {
            slot: slot.to_string(),
            message: e.to_string(),
        })
}

fn persist<T: Serialize>(
    slots: &mut dyn SlotStorage,
    slot: &'static str,
    records: &[T],
) -> Result<bool, StoreError> {
    let Some(text) = encode(slot, records)? else {
        return Ok(false);
    };
    slots
        .write_slot(slot, &text)
        .map_err(|e| StoreError::Persist {
            slot: slot.to_string(),
            message: format!("{e:#}"),
        })?;
    Ok(true)
}

fn fresh_id<R: Record>(records: &[R], collection: &'static str) -> Result<i64, StoreError> {
    next_id(records).ok_or_else(|| {
        warn!(collection, "largest id is i64::MAX, cannot assign another");
        StoreError::IdsExhausted { collection }
    })
}

fn upsert<R: Record>(
    records: &mut Vec<R>,
    mut record: R,
    is_new: bool,
    collection: &'static str,
) -> Result<SaveOutcome, StoreError> {
    if is_new {
        let taken = records.iter().any(|r| r.id() == record.id());
        if record.id() <= 0 || taken {
            let fresh = fresh_id(records, collection)?;
            if taken {
                warn!(
                    requested = record.id(),
                    assigned = fresh,
                    "new record id already in use, reassigning"
                );
            }
            record.set_id(fresh);
        }
        let id = record.id();
        records.push(record);
        return Ok(SaveOutcome {
            id,
            created: true,
            matched: true,
        });
    }

    let id = record.id();
    Ok(match records.iter_mut().find(|r| r.id() == id) {
        Some(slot) => {
            *slot = record;
            SaveOutcome {
                id,
                created: false,
                matched: true,
            }
        }
        None => SaveOutcome {
            id,
            created: false,
            matched: false,
        },
    })
}

fn remove<R: Record>(records: &mut Vec<R>, id: i64) -> bool {
    let before = records.len();
    records.retain(|r| r.id() != id);
    records.len() != before
}
