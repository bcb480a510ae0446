use serde::{Deserialize, Deserializer};

/// One or more column names, e.g. a single-column or a composite unique key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnList {
    One(String),
    Many(Vec<String>),
}

impl ColumnList {
    pub fn as_slice(&self) -> &[String] {
        match self {
            ColumnList::One(column) => std::slice::from_ref(column),
            ColumnList::Many(columns) => columns,
        }
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
        self.as_slice().iter().map(String::as_str)
    }

    pub fn is_composite(&self) -> bool {
        self.as_slice().len() > 1
    }
}

impl From<&str> for ColumnList {
    fn from(column: &str) -> Self {
        ColumnList::One(column.to_owned())
    }
}

impl From<String> for ColumnList {
    fn from(column: String) -> Self {
        ColumnList::One(column)
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        ColumnList::Many(iter.into_iter().map(Into::into).collect())
    }
}

// #[serde(untagged)] would hide the actual error behind `data did not match any variant`.
impl<'de> Deserialize<'de> for ColumnList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{Error, SeqAccess, Visitor};
        struct ColumnListVisitor;

        impl<'de> Visitor<'de> for ColumnListVisitor {
            type Value = ColumnList;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a column name or a list of column names")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: Error,
            {
                Ok(ColumnList::One(value.to_owned()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: Error,
            {
                Ok(ColumnList::One(value))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut columns = Vec::with_capacity(seq.size_hint().unwrap_or_default());
                while let Some(column) = seq.next_element::<String>()? {
                    columns.push(column);
                }

                if columns.is_empty() {
                    return Err(A::Error::invalid_length(0, &self));
                }

                Ok(ColumnList::Many(columns))
            }
        }

        deserializer.deserialize_any(ColumnListVisitor)
    }
}
