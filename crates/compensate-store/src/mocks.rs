use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;

use crate::collection::DocumentCollection;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Insert(Value),
    Delete(String),
    FindAndDelete(String),
}

#[derive(Debug, Error)]
#[error("mock collection refused to {0}")]
pub(crate) struct MockRefusal(&'static str);

/// Records every call and answers from scripted results.
///
/// Unscripted inserts and deletes succeed; inserts are assigned `id-1`,
/// `id-2`, ... in call order. `find_and_delete` fails unless a document was
/// supplied with [`with_found_document`](Self::with_found_document).
#[derive(Default)]
pub(crate) struct MockCollection {
    calls: Mutex<Vec<Call>>,
    inserts: Mutex<usize>,
    insert_results: Mutex<VecDeque<bool>>,
    delete_results: Mutex<VecDeque<bool>>,
    found_document: Option<Value>,
}

impl MockCollection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_insert_results(self, results: impl IntoIterator<Item = bool>) -> Self {
        *self.insert_results.lock().expect("lock poisoned") = results.into_iter().collect();
        self
    }

    pub(crate) fn with_delete_results(self, results: impl IntoIterator<Item = bool>) -> Self {
        *self.delete_results.lock().expect("lock poisoned") = results.into_iter().collect();
        self
    }

    pub(crate) fn with_found_document(mut self, document: Value) -> Self {
        self.found_document = Some(document);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("lock poisoned").push(call);
    }

    fn next_result(results: &Mutex<VecDeque<bool>>) -> bool {
        results
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or(true)
    }
}

impl DocumentCollection for MockCollection {
    type Id = String;
    type Document = Value;
    type Error = MockRefusal;

    fn name(&self) -> &str {
        "mock"
    }

    fn insert_document(&self, document: &Value) -> Result<String, MockRefusal> {
        self.record(Call::Insert(document.clone()));
        if !Self::next_result(&self.insert_results) {
            return Err(MockRefusal("insert"));
        }
        let mut inserts = self.inserts.lock().expect("lock poisoned");
        *inserts += 1;
        Ok(format!("id-{inserts}"))
    }

    fn delete_document(&self, id: &String) -> Result<(), MockRefusal> {
        self.record(Call::Delete(id.clone()));
        if Self::next_result(&self.delete_results) {
            Ok(())
        } else {
            Err(MockRefusal("delete"))
        }
    }

    fn find_and_delete_document(&self, id: &String) -> Result<Value, MockRefusal> {
        self.record(Call::FindAndDelete(id.clone()));
        self.found_document
            .clone()
            .ok_or(MockRefusal("find and delete"))
    }
}
