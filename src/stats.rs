use crate::model::{ScheduleItem, Student, Subject};
use serde::Serialize;
use std::collections::HashSet;

pub const TOP_PERFORMERS: usize = 3;
pub const UPCOMING_LESSONS: usize = 3;

/// Arithmetic mean of the subject grades, 0 when there are none.
pub fn average_grade(subjects: &[Subject]) -> f64 {
    if subjects.is_empty() {
        return 0.0;
    }
    // Summed as f64 so extreme grades cannot overflow.
    let sum: f64 = subjects.iter().map(|s| s.grade as f64).sum();
    sum / subjects.len() as f64
}

pub fn cohort_average(students: &[Student]) -> f64 {
    if students.is_empty() {
        return 0.0;
    }
    let sum: f64 = students.iter().map(|s| s.avg_grade).sum();
    sum / students.len() as f64
}

pub fn group_count(students: &[Student]) -> usize {
    students
        .iter()
        .map(|s| s.group.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Highest `avg_grade` first. The sort is stable, so equal averages keep
/// collection order.
pub fn top_performers(students: &[Student]) -> Vec<&Student> {
    let mut ranked: Vec<&Student> = students.iter().collect();
    ranked.sort_by(|a, b| b.avg_grade.total_cmp(&a.avg_grade));
    ranked.truncate(TOP_PERFORMERS);
    ranked
}

pub fn upcoming_lessons(schedule: &[ScheduleItem]) -> &[ScheduleItem] {
    &schedule[..schedule.len().min(UPCOMING_LESSONS)]
}

/// First character of each space-separated part of the name.
pub fn initials(name: &str) -> String {
    name.split(' ').filter_map(|part| part.chars().next()).collect()
}

pub fn format_grade(value: f64) -> String {
    format!("{value:.1}")
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCard {
    #[serde(flatten)]
    pub student: Student,
    pub initials: String,
    pub avg_grade_display: String,
}

impl StudentCard {
    pub fn new(student: &Student) -> Self {
        Self {
            initials: initials(&student.name),
            avg_grade_display: format_grade(student.avg_grade),
            student: student.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_students: usize,
    pub group_count: usize,
    pub cohort_average: f64,
    pub cohort_average_display: String,
    pub schedule_count: usize,
    pub top_performers: Vec<StudentCard>,
    pub upcoming: Vec<ScheduleItem>,
}

pub fn dashboard(students: &[Student], schedule: &[ScheduleItem]) -> Dashboard {
    let cohort = cohort_average(students);
    Dashboard {
        total_students: students.len(),
        group_count: group_count(students),
        cohort_average: cohort,
        cohort_average_display: format_grade(cohort),
        schedule_count: schedule.len(),
        top_performers: top_performers(students)
            .into_iter()
            .map(StudentCard::new)
            .collect(),
        upcoming: upcoming_lessons(schedule).to_vec(),
    }
}
