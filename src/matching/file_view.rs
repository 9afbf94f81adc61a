use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::matching::report::Report;

/// Per-unit view of an analysis: for every original unit name, the groups of
/// tied libraries that explained it, in report order.
#[derive(Debug, Clone, Default)]
pub struct FileView {
    groups: BTreeMap<String, Vec<Vec<String>>>,
}

impl FileView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view covering `names`, filled from `reports`
    pub fn from_reports<'r, I>(names: I, reports: impl IntoIterator<Item = &'r Report>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut view = Self::new();
        view.register_names(names);
        for report in reports {
            view.add(report);
        }
        view
    }

    /// Make sure every name appears, even if nothing explains it
    pub fn register_names<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        for name in names {
            self.groups.entry(name).or_default();
        }
    }

    /// Record the report's library group against each of its matched names
    pub fn add(&mut self, report: &Report) {
        let group: Vec<String> = report
            .library_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in report.matched_names() {
            self.groups.entry(name.clone()).or_default().push(group.clone());
        }
    }

    /// Library groups recorded for `name`, `None` if the name is unknown
    #[must_use]
    pub fn groups(&self, name: &str) -> Option<&[Vec<String>]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Names with no explaining library
    pub fn unmatched(&self) -> impl Iterator<Item = &str> + '_ {
        self.groups
            .iter()
            .filter(|(_, groups)| groups.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// One line per name: `name\tlibA;libB;\tlibC;\t`
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for (name, groups) in &self.groups {
            write!(out, "{name}\t")?;
            for group in groups {
                for library in group {
                    write!(out, "{library};")?;
                }
                write!(out, "\t")?;
            }
            writeln!(out)?;
        }
        out.flush()
    }
}
