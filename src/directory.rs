//! The fixed, role-partitioned list of identities allowed to log in.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::Path;

use crate::models::{Identity, Role, StudentProfile};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directory {
    students: Vec<Identity>,
    staff: Vec<Identity>,
    tpo: Vec<Identity>,
}

impl Directory {
    pub fn new(students: Vec<Identity>, staff: Vec<Identity>, tpo: Vec<Identity>) -> anyhow::Result<Self> {
        for (role, entries) in [(Role::Student, &students), (Role::Staff, &staff), (Role::Tpo, &tpo)] {
            if let Some(stray) = entries.iter().find(|e| e.role() != role) {
                bail!("`{}` is a {} but was listed under {}", stray.id(), stray.role(), role);
            }
            for (idx, entry) in entries.iter().enumerate() {
                if entries[..idx].iter().any(|earlier| earlier.id() == entry.id()) {
                    bail!("`{}` is listed twice under {}", entry.id(), role);
                }
            }
        }
        Ok(Self { students, staff, tpo })
    }

    pub fn partition(&self, role: Role) -> &[Identity] {
        match role {
            Role::Student => &self.students,
            Role::Staff => &self.staff,
            Role::Tpo => &self.tpo,
        }
    }

    pub fn find(&self, role: Role, id: &str) -> Option<&Identity> {
        self.partition(role).iter().find(|entry| entry.id() == id)
    }

    pub fn len(&self) -> usize {
        self.students.len() + self.staff.len() + self.tpo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let file: DirectoryFile = serde_json::from_str(raw).context("malformed directory json")?;
        Self::new(
            convert(file.student, Role::Student)?,
            convert(file.staff, Role::Staff)?,
            convert(file.tpo, Role::Tpo)?,
        )
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read directory file {}", path.display()))?;
        Self::from_json(&raw)
    }

    /// The accounts the portal ships with.
    pub fn seed() -> Self {
        Self {
            students: vec![
                Identity::student(
                    "21CS001",
                    "Aarav Sharma",
                    StudentProfile {
                        year: Some("Third Year".to_string()),
                        department: Some("Computer Engineering".to_string()),
                        cgpa: Some(8.7),
                        attendance: Some(92),
                        division: Some("A".to_string()),
                        semester: Some(6),
                    },
                ),
                Identity::student(
                    "21CS002",
                    "Priya Patel",
                    StudentProfile {
                        year: Some("Third Year".to_string()),
                        department: Some("Computer Engineering".to_string()),
                        cgpa: Some(9.1),
                        attendance: Some(88),
                        division: Some("B".to_string()),
                        semester: Some(6),
                    },
                ),
                Identity::student(
                    "22IT014",
                    "Rohan Deshmukh",
                    StudentProfile {
                        year: Some("Second Year".to_string()),
                        department: Some("Information Technology".to_string()),
                        cgpa: Some(7.9),
                        attendance: Some(76),
                        division: Some("A".to_string()),
                        semester: Some(4),
                    },
                ),
            ],
            staff: vec![
                Identity::staff("STF001", "Dr. Meera Kulkarni"),
                Identity::staff("STF002", "Prof. Anil Joshi"),
            ],
            tpo: vec![Identity::tpo("TPO001", "Sunita Rao")],
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    student: Vec<DirectoryEntry>,
    #[serde(default)]
    staff: Vec<DirectoryEntry>,
    #[serde(default)]
    tpo: Vec<DirectoryEntry>,
}

#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    id: String,
    name: String,
    role: Role,
    #[serde(flatten)]
    profile: StudentProfile,
}

fn convert(entries: Vec<DirectoryEntry>, partition: Role) -> anyhow::Result<Vec<Identity>> {
    entries
        .into_iter()
        .map(|entry| {
            let role = entry.role;
            if role != partition {
                bail!("`{}` is a {} but was listed under {}", entry.id, role, partition);
            }
            Ok(match role {
                Role::Student => Identity::student(entry.id, entry.name, entry.profile),
                Role::Staff | Role::Tpo if entry.profile != StudentProfile::default() => {
                    bail!("`{}` carries student profile fields but is a {}", entry.id, role)
                }
                Role::Staff => Identity::staff(entry.id, entry.name),
                Role::Tpo => Identity::tpo(entry.id, entry.name),
            })
        })
        .collect()
}
