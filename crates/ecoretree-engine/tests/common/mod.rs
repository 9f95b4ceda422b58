use std::sync::Arc;

use ecoretree_core::model::ecore::{EATTRIBUTE, ECLASS, EDATATYPE, EPACKAGE};
use ecoretree_core::EcoreLabelResolver;
use ecoretree_engine::memory::{InMemoryModelServer, RecordingHost};
use ecoretree_engine::{SyncConfig, SyncCoordinator};
use serde_json::{json, Value};

pub const DOCUMENT_ID: &str = "library.ecore";

#[allow(dead_code)]
pub fn library() -> Value {
    json!({
        "eClass": EPACKAGE,
        "name": "library",
        "eClassifiers": [
            {
                "eClass": ECLASS,
                "name": "Book",
                "eStructuralFeatures": [
                    {"eClass": EATTRIBUTE, "name": "pages",
                     "eType": {"eClass": EDATATYPE, "$ref": "//Pages"}}
                ]
            },
            {"eClass": EDATATYPE, "name": "Pages", "instanceClassName": "int"}
        ]
    })
}

#[allow(dead_code)]
pub struct Fixture {
    pub server: Arc<InMemoryModelServer>,
    pub host: Arc<RecordingHost>,
    pub coordinator: SyncCoordinator,
}

/// Coordinator over an in-memory server holding `library.ecore`
#[allow(dead_code)]
pub async fn fixture() -> Fixture {
    let server = InMemoryModelServer::new();
    server.put_document(DOCUMENT_ID, library()).await;
    let host = RecordingHost::new();
    let coordinator = SyncCoordinator::new(
        &SyncConfig::new("file:///ws", DOCUMENT_ID),
        server.clone(),
        host.clone(),
        Arc::new(EcoreLabelResolver),
    );
    Fixture {
        server,
        host,
        coordinator,
    }
}
