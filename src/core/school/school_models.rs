// School domain models - courses, groups (classes) and gradebooks.
//
// These are pure domain types with no Discord dependencies. Users are plain
// u64 ids; a Group maps one-to-one onto a `[Class] <name>` role on Discord.

use crate::core::grading::{Grade, GradeFormat};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// One recorded grade plus who recorded it and when.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeEntry {
    pub grade: Grade,
    /// Scale the grade was given on; the guild format may change later.
    pub scale_limit: u32,
    pub recorded_by: u64,
    pub recorded_at: DateTime<Utc>,
}

impl GradeEntry {
    /// Render with the guild's current style but the grade's own scale.
    pub fn render(&self, format: &GradeFormat) -> String {
        if self.scale_limit == format.scale_limit {
            return format.encode(&self.grade);
        }
        GradeFormat {
            scale_limit: self.scale_limit,
            ..format.clone()
        }
        .encode(&self.grade)
    }
}

/// Grades for one group within one course.
#[derive(Debug, Clone, Default)]
pub struct GradeBook {
    pub course: String,
    pub group: String,
    entries: BTreeMap<u64, Vec<GradeEntry>>,
}

impl GradeBook {
    pub fn new(course: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            course: course.into(),
            group: group.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, student_id: u64, entry: GradeEntry) {
        self.entries.entry(student_id).or_default().push(entry);
    }

    /// Grades for a student, oldest first.
    pub fn grades_of(&self, student_id: u64) -> &[GradeEntry] {
        self.entries
            .get(&student_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All students with at least one grade, in id order.
    pub fn entries(&self) -> impl Iterator<Item = (u64, &[GradeEntry])> {
        self.entries.iter().map(|(id, grades)| (*id, grades.as_slice()))
    }

    pub fn remove_student(&mut self, student_id: u64) -> bool {
        self.entries.remove(&student_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A class of students, optionally with one supervising teacher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub name: String,
    pub supervisor_id: Option<u64>,
    pub student_ids: BTreeSet<u64>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Course {
    pub name: String,
    pub description: String,
    pub teacher_ids: BTreeSet<u64>,
    pub student_ids: BTreeSet<u64>,
    pub start_date: DateTime<Utc>,
    /// Set once the course is closed; closed courses accept no new grades.
    pub end_date: Option<DateTime<Utc>>,
    /// Keyed by group name.
    pub gradebooks: BTreeMap<String, GradeBook>,
}

impl Course {
    pub fn new(name: impl Into<String>, description: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            teacher_ids: BTreeSet::new(),
            student_ids: BTreeSet::new(),
            start_date: start,
            end_date: None,
            gradebooks: BTreeMap::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.end_date.is_some()
    }
}

/// Everything the bot knows about one guild's school.
#[derive(Debug, Clone)]
pub struct School {
    pub guild_id: u64,
    pub name: String,
    pub courses: BTreeMap<String, Course>,
    pub groups: BTreeMap<String, Group>,
}

impl School {
    pub fn new(guild_id: u64, name: impl Into<String>) -> Self {
        Self {
            guild_id,
            name: name.into(),
            courses: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }

    /// Groups the student belongs to.
    pub fn groups_of(&self, student_id: u64) -> Vec<&Group> {
        self.groups
            .values()
            .filter(|g| g.student_ids.contains(&student_id))
            .collect()
    }
}
