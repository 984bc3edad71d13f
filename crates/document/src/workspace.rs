use model::Channel;
use slotmap::SlotMap;
use tiles::{NoProgress, ProgressHook};

use crate::HistoryConfig;
use crate::budget::UndoBudget;
use crate::commit::CommitRequest;
use crate::error::HistoryError;
use crate::history::History;
use crate::image::LiveImage;
use crate::kind::{EditContext, UndoKind};

slotmap::new_key_type! {
    pub struct DocumentId;
}

/// A live image together with its history.
#[derive(Debug)]
pub struct Document {
    image: LiveImage,
    history: History,
}

impl Document {
    pub fn new(image: LiveImage, history: History) -> Self {
        Self { image, history }
    }

    pub fn image(&self) -> &LiveImage {
        &self.image
    }

    /// Pixel access for tools. Commit first.
    pub fn image_mut(&mut self) -> &mut LiveImage {
        &mut self.image
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn commit(&mut self, request: &CommitRequest) -> Result<(), HistoryError> {
        self.commit_with_progress(request, &mut NoProgress)
    }

    pub fn commit_with_progress(
        &mut self,
        request: &CommitRequest,
        progress: &mut dyn ProgressHook,
    ) -> Result<(), HistoryError> {
        self.history.commit(&mut self.image, request, progress)
    }

    pub fn commit_kind(&mut self, kind: UndoKind, context: EditContext) -> Result<(), HistoryError> {
        let request = kind.request(&self.image, context);
        self.commit(&request)
    }

    pub fn undo(&mut self) -> Result<bool, HistoryError> {
        self.undo_with_progress(&mut NoProgress)
    }

    pub fn undo_with_progress(
        &mut self,
        progress: &mut dyn ProgressHook,
    ) -> Result<bool, HistoryError> {
        self.history.undo(&mut self.image, progress)
    }

    pub fn redo(&mut self) -> Result<bool, HistoryError> {
        self.redo_with_progress(&mut NoProgress)
    }

    pub fn redo_with_progress(
        &mut self,
        progress: &mut dyn ProgressHook,
    ) -> Result<bool, HistoryError> {
        self.history.redo(&mut self.image, progress)
    }

    pub fn previous_channel(&self, channel: Channel) -> Option<&[u8]> {
        self.history.previous_channel(channel, &self.image)
    }

    fn into_image(self) -> LiveImage {
        self.image
    }
}

/// Open documents sharing one undo budget.
#[derive(Debug)]
pub struct Workspace {
    documents: SlotMap<DocumentId, Document>,
    budget: UndoBudget,
    config: HistoryConfig,
}

impl Workspace {
    pub fn new(config: HistoryConfig, budget: UndoBudget) -> Self {
        Self {
            documents: SlotMap::with_key(),
            budget,
            config,
        }
    }

    pub fn budget(&self) -> &UndoBudget {
        &self.budget
    }

    pub fn set_budget_ceiling(&mut self, bytes: usize) {
        self.budget.set_ceiling(bytes);
        log::debug!(
            "undo budget ceiling set to {bytes} bytes, {} per document",
            self.budget.per_document_limit()
        );
    }

    pub fn open_document(&mut self, image: LiveImage) -> DocumentId {
        let history = History::new(self.config, self.budget.lease());
        self.documents.insert(Document::new(image, history))
    }

    /// Drops the document's history and hands back its image.
    pub fn close_document(&mut self, id: DocumentId) -> Option<LiveImage> {
        self.documents.remove(id).map(Document::into_image)
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn total_history_bytes(&mut self) -> usize {
        self.documents
            .values_mut()
            .map(|document| document.history.byte_cost())
            .sum()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(HistoryConfig::default(), UndoBudget::default())
    }
}
