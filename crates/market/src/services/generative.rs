//! Results of the generative services (recipes, price suggestions).
//!
//! The services themselves live outside the engine and are never awaited
//! under a store lock. A price suggestion is applied as an ordinary product
//! edit; recipe text is streamed into a buffer that drops chunks from
//! superseded requests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use harvest_hub_core::{Money, ProductId};

/// A suggested new price for a product.
///
/// Applying one is an ordinary product edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSuggestion {
    pub product_id: ProductId,
    pub suggested_price: Money,
    pub reason: String,
}

/// Identifies one recipe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Current state of the recipe buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeView {
    pub generation: Generation,
    pub product_id: Option<ProductId>,
    pub text: String,
}

#[derive(Debug)]
struct FeedState {
    generation: u64,
    product_id: Option<ProductId>,
    text: String,
}

/// Shared recipe display buffer.
///
/// Starting a request for a new product supersedes the previous one: chunks
/// tagged with an older [`Generation`] are dropped and the stream feeding them
/// is abandoned.
#[derive(Debug, Clone)]
pub struct RecipeFeed {
    state: Arc<Mutex<FeedState>>,
}

impl Default for RecipeFeed {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedState {
                generation: 0,
                product_id: None,
                text: String::new(),
            })),
        }
    }
}

impl RecipeFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new request, clearing the buffer.
    pub fn begin(&self, product_id: ProductId) -> Generation {
        let mut state = self.lock();
        state.generation += 1;
        state.product_id = Some(product_id);
        state.text.clear();
        Generation(state.generation)
    }

    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        self.lock().generation == generation.0
    }

    /// Append a chunk if `generation` is still current.
    pub fn append(&self, generation: Generation, chunk: &str) -> bool {
        let mut state = self.lock();
        if state.generation != generation.0 {
            return false;
        }
        state.text.push_str(chunk);
        true
    }

    #[must_use]
    pub fn view(&self) -> RecipeView {
        let state = self.lock();
        RecipeView {
            generation: Generation(state.generation),
            product_id: state.product_id,
            text: state.text.clone(),
        }
    }

    /// Feed `chunks` into the buffer until the stream ends or the request is
    /// superseded. Returns the number of chunks accepted.
    pub async fn drive<S>(&self, generation: Generation, chunks: S) -> usize
    where
        S: Stream<Item = String>,
    {
        let mut chunks = std::pin::pin!(chunks);
        let mut accepted = 0;
        while let Some(chunk) = chunks.next().await {
            if !self.append(generation, &chunk) {
                tracing::debug!(accepted, "recipe request superseded");
                break;
            }
            accepted += 1;
        }
        accepted
    }
}
