//! Parametrised agent names such as `A`, `Node[3]` or `Cell[1,2]`.

use std::fmt;

/// Family name plus the integer indexes that instantiate it.
///
/// Two names are the same agent iff family and indexes are equal; the number
/// of indexes is the family's arity and must be the same for every instance.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct AgentName {
    pub family:  String,
    pub indexes: Vec<i64>,
}

impl AgentName {
    pub fn new(family: impl Into<String>, indexes: &[i64]) -> Self {
        Self {
            family:  family.into(),
            indexes: indexes.to_vec(),
        }
    }

    /// Name without indexes.
    pub fn plain(family: impl Into<String>) -> Self {
        Self::new(family, &[])
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.indexes.len()
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.family)?;
        if !self.indexes.is_empty() {
            let parts: Vec<String> = self.indexes.iter().map(i64::to_string).collect();
            write!(f, "[{}]", parts.join(","))?;
        }
        Ok(())
    }
}
