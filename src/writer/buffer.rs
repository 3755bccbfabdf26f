use crate::core::types::Row;

/// Staging area for rows not yet assigned to a partition
pub struct InsertBuffer {
    rows: Vec<Row>,
    capacity: usize,
}

impl InsertBuffer {
    pub fn new(capacity: usize) -> Self {
        InsertBuffer {
            rows: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Stage a row; returns true once the buffer holds a full partition
    pub fn push(&mut self, row: Row) -> bool {
        self.rows.push(row);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.capacity
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Unstage the most recently pushed row
    pub fn pop(&mut self) -> Option<Row> {
        self.rows.pop()
    }

    /// Drop staged rows once they have been persisted
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn reports_full_at_capacity() {
        let mut buffer = InsertBuffer::new(2);
        assert!(!buffer.push(row! { "id" => 1 }));
        assert!(buffer.push(row! { "id" => 2 }));
        assert_eq!(buffer.len(), 2);

        assert_eq!(buffer.pop(), Some(row! { "id" => 2 }));
        assert!(!buffer.is_full());

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 2);
    }
}
