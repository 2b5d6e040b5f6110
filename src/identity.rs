use unicode_normalization::UnicodeNormalization;

const FILENAME_EXTRA_CHARS: &str = "-_.() ";

/// Who the tracked time belongs to. The employee selects the session file;
/// company and position only label reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    pub company: String,
    pub employee: String,
    pub position: String,
}

impl Identity {
    pub fn new(
        company: impl Into<String>,
        employee: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            employee: employee.into(),
            position: position.into(),
        }
    }

    pub fn session_file_name(&self) -> String {
        session_file_name(&self.employee)
    }
}

/// Reduce a name to ASCII letters, digits and `-_.() `.
///
/// Accented letters keep their base letter (NFKD then drop combining marks);
/// anything else is removed.
pub fn sanitize_filename(name: &str) -> String {
    name.nfkd()
        .filter(|c| c.is_ascii_alphanumeric() || FILENAME_EXTRA_CHARS.contains(*c))
        .collect()
}

/// File name holding an employee's sessions.
///
/// Names that survive sanitization untouched map to `sessions_<name>.json`.
/// Lossy names get a short digest of the raw name appended so that, say,
/// two Cyrillic names never share a file.
pub fn session_file_name(employee: &str) -> String {
    let sanitized = sanitize_filename(employee);
    if !sanitized.is_empty() && sanitized == employee {
        format!("sessions_{sanitized}.json")
    } else {
        let digest = format!("{:x}", md5::compute(employee.as_bytes()));
        format!("sessions_{sanitized}-{}.json", &digest[..8])
    }
}
