use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// First entry of the question section, kept for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: Arc<str>,
    pub record_type: Arc<str>,
    pub class: Arc<str>,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.class, self.record_type)
    }
}

/// A decoded client query.
///
/// `raw` is forwarded to the upstream byte for byte; the remaining fields are
/// what the codec extracted so a SERVFAIL can be synthesized without
/// re-parsing.
#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub id: u16,
    pub flags: u16,
    pub question: Option<Question>,
    pub question_count: u16,
    /// Wire encoding of the whole question section.
    pub question_wire: Bytes,
    pub raw: Bytes,
}

impl DnsQuery {
    pub fn new(id: u16, flags: u16, raw: impl Into<Bytes>) -> Self {
        Self {
            id,
            flags,
            question: None,
            question_count: 0,
            question_wire: Bytes::new(),
            raw: raw.into(),
        }
    }

    pub fn with_question(
        mut self,
        question: Option<Question>,
        question_count: u16,
        question_wire: impl Into<Bytes>,
    ) -> Self {
        self.question = question;
        self.question_count = question_count;
        self.question_wire = question_wire.into();
        self
    }

    pub fn recursion_desired(&self) -> bool {
        self.flags & 0x0100 != 0
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn describe(&self) -> String {
        match &self.question {
            Some(q) => q.to_string(),
            None => "<no question>".to_string(),
        }
    }
}
