//! Catalog (C3): thread-safe hierarchical store of libraries, documents,
//! and chunks with cascade-delete and atomic composite reads.
//!
//! One `std::sync::Mutex<CatalogState>` guards the whole catalog. Cascade
//! delete is implemented as a private function operating directly on the
//! already-locked `&mut CatalogState` — it never re-acquires the lock — so
//! a plain (non-reentrant) `Mutex` gives callers the same atomicity a
//! reentrant guard would, without pulling in a third-party reentrant-mutex
//! crate (see `DESIGN.md`).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Chunk, Document, Library, Metadata};

#[derive(Default)]
struct CatalogState {
    libraries: HashMap<Uuid, Library>,
    documents: HashMap<Uuid, Document>,
    chunks: HashMap<Uuid, Chunk>,
    library_documents: HashMap<Uuid, HashSet<Uuid>>,
    document_chunks: HashMap<Uuid, HashSet<Uuid>>,
}

/// A library together with its full descendant tree, returned as an
/// independent snapshot — mutating it never affects the catalog.
#[derive(Debug, Clone)]
pub struct LibraryTree {
    pub library: Library,
    pub documents: Vec<Document>,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    pub libraries: usize,
    pub documents: usize,
    pub chunks: usize,
}

pub struct Catalog {
    state: Mutex<CatalogState>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CatalogState::default()),
        }
    }

    // ---- libraries ----------------------------------------------------

    pub fn create_library(&self, id: Uuid, name: String, metadata: Metadata) -> Result<Library> {
        Library::validate_name(&name)?;
        let mut state = self.state.lock().unwrap();
        if state.libraries.contains_key(&id) {
            return Err(Error::AlreadyExists(id.to_string()));
        }
        let library = Library {
            id,
            name,
            metadata,
            created_at: Utc::now(),
        };
        state.libraries.insert(id, library.clone());
        state.library_documents.insert(id, HashSet::new());
        Ok(library)
    }

    pub fn get_library(&self, id: Uuid) -> Option<Library> {
        self.state.lock().unwrap().libraries.get(&id).cloned()
    }

    pub fn get_library_tree(&self, id: Uuid) -> Option<LibraryTree> {
        let state = self.state.lock().unwrap();
        let library = state.libraries.get(&id)?.clone();
        let document_ids = state.library_documents.get(&id).cloned().unwrap_or_default();
        let documents: Vec<Document> = document_ids
            .iter()
            .filter_map(|did| state.documents.get(did).cloned())
            .collect();
        let chunks: Vec<Chunk> = document_ids
            .iter()
            .flat_map(|did| state.document_chunks.get(did).cloned().unwrap_or_default())
            .filter_map(|cid| state.chunks.get(&cid).cloned())
            .collect();
        Some(LibraryTree {
            library,
            documents,
            chunks,
        })
    }

    pub fn list_libraries(&self) -> Vec<Library> {
        self.state.lock().unwrap().libraries.values().cloned().collect()
    }

    pub fn update_library(
        &self,
        id: Uuid,
        name: Option<String>,
        metadata: Option<Metadata>,
    ) -> Result<Library> {
        if let Some(ref name) = name {
            Library::validate_name(name)?;
        }
        let mut state = self.state.lock().unwrap();
        let library = state
            .libraries
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if let Some(name) = name {
            library.name = name;
        }
        if let Some(metadata) = metadata {
            library.metadata = metadata;
        }
        Ok(library.clone())
    }

    /// Delete a library and cascade to every descendant document/chunk.
    /// Returns whether the library existed.
    pub fn delete_library(&self, id: Uuid) -> bool {
        let mut state = self.state.lock().unwrap();
        delete_library_locked(&mut state, id)
    }

    // ---- documents ------------------------------------------------------

    pub fn create_document(
        &self,
        id: Uuid,
        library_id: Uuid,
        title: String,
        metadata: Metadata,
    ) -> Result<Document> {
        Document::validate_title(&title)?;
        let mut state = self.state.lock().unwrap();
        if !state.libraries.contains_key(&library_id) {
            return Err(Error::ParentMissing(library_id.to_string()));
        }
        if state.documents.contains_key(&id) {
            return Err(Error::AlreadyExists(id.to_string()));
        }
        let now = Utc::now();
        let document = Document {
            id,
            library_id,
            title,
            metadata,
            created_at: now,
            updated_at: now,
        };
        state.documents.insert(id, document.clone());
        state.document_chunks.insert(id, HashSet::new());
        state.library_documents.entry(library_id).or_default().insert(id);
        Ok(document)
    }

    pub fn get_document(&self, id: Uuid) -> Option<Document> {
        self.state.lock().unwrap().documents.get(&id).cloned()
    }

    pub fn list_documents_for_library(&self, library_id: Uuid) -> Vec<Document> {
        let state = self.state.lock().unwrap();
        state
            .library_documents
            .get(&library_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|did| state.documents.get(&did).cloned())
            .collect()
    }

    pub fn update_document(
        &self,
        id: Uuid,
        title: Option<String>,
        metadata: Option<Metadata>,
    ) -> Result<Document> {
        if let Some(ref title) = title {
            Document::validate_title(title)?;
        }
        let mut state = self.state.lock().unwrap();
        let document = state
            .documents
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if let Some(title) = title {
            document.title = title;
        }
        if let Some(metadata) = metadata {
            document.metadata = metadata;
        }
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    /// Delete a document and cascade to its chunks. Returns whether the
    /// document existed.
    pub fn delete_document(&self, id: Uuid) -> bool {
        let mut state = self.state.lock().unwrap();
        delete_document_locked(&mut state, id)
    }

    // ---- chunks -----------------------------------------------------------

    pub fn create_chunk(
        &self,
        id: Uuid,
        document_id: Uuid,
        text: String,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Result<Chunk> {
        Chunk::validate_text(&text)?;
        let mut state = self.state.lock().unwrap();
        if !state.documents.contains_key(&document_id) {
            return Err(Error::ParentMissing(document_id.to_string()));
        }
        if state.chunks.contains_key(&id) {
            return Err(Error::AlreadyExists(id.to_string()));
        }
        let now = Utc::now();
        let chunk = Chunk {
            id,
            document_id,
            text,
            embedding,
            metadata,
            created_at: now,
            updated_at: now,
        };
        state.chunks.insert(id, chunk.clone());
        state.document_chunks.entry(document_id).or_default().insert(id);
        Ok(chunk)
    }

    pub fn get_chunk(&self, id: Uuid) -> Option<Chunk> {
        self.state.lock().unwrap().chunks.get(&id).cloned()
    }

    pub fn list_chunks_for_document(&self, document_id: Uuid) -> Vec<Chunk> {
        let state = self.state.lock().unwrap();
        state
            .document_chunks
            .get(&document_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|cid| state.chunks.get(&cid).cloned())
            .collect()
    }

    pub fn list_chunks_for_library(&self, library_id: Uuid) -> Vec<Chunk> {
        let state = self.state.lock().unwrap();
        state
            .library_documents
            .get(&library_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .flat_map(|did| state.document_chunks.get(&did).cloned().unwrap_or_default())
            .filter_map(|cid| state.chunks.get(&cid).cloned())
            .collect()
    }

    pub fn update_chunk(
        &self,
        id: Uuid,
        text: Option<String>,
        embedding: Option<Vec<f32>>,
        metadata: Option<Metadata>,
    ) -> Result<Chunk> {
        if let Some(ref text) = text {
            Chunk::validate_text(text)?;
        }
        let mut state = self.state.lock().unwrap();
        let chunk = state
            .chunks
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if let Some(text) = text {
            chunk.text = text;
        }
        if let Some(embedding) = embedding {
            chunk.embedding = embedding;
        }
        if let Some(metadata) = metadata {
            chunk.metadata = metadata;
        }
        chunk.updated_at = Utc::now();
        Ok(chunk.clone())
    }

    /// Delete a chunk. Returns whether it existed.
    pub fn delete_chunk(&self, id: Uuid) -> bool {
        let mut state = self.state.lock().unwrap();
        delete_chunk_locked(&mut state, id)
    }

    pub fn stats(&self) -> CatalogStats {
        let state = self.state.lock().unwrap();
        CatalogStats {
            libraries: state.libraries.len(),
            documents: state.documents.len(),
            chunks: state.chunks.len(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

fn delete_chunk_locked(state: &mut CatalogState, id: Uuid) -> bool {
    let Some(chunk) = state.chunks.remove(&id) else {
        return false;
    };
    if let Some(siblings) = state.document_chunks.get_mut(&chunk.document_id) {
        siblings.remove(&id);
    }
    true
}

fn delete_document_locked(state: &mut CatalogState, id: Uuid) -> bool {
    let Some(document) = state.documents.remove(&id) else {
        return false;
    };
    let chunk_ids = state.document_chunks.remove(&id).unwrap_or_default();
    for chunk_id in chunk_ids {
        state.chunks.remove(&chunk_id);
    }
    if let Some(siblings) = state.library_documents.get_mut(&document.library_id) {
        siblings.remove(&id);
    }
    true
}

fn delete_library_locked(state: &mut CatalogState, id: Uuid) -> bool {
    let Some(_library) = state.libraries.remove(&id) else {
        return false;
    };
    let document_ids = state.library_documents.remove(&id).unwrap_or_default();
    for document_id in document_ids {
        let chunk_ids = state.document_chunks.remove(&document_id).unwrap_or_default();
        for chunk_id in chunk_ids {
            state.chunks.remove(&chunk_id);
        }
        state.documents.remove(&document_id);
    }
    true
}
