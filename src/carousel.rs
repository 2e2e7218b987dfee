//! Carousel: an ordered strip of selectable model cards.
//!
//! The carousel holds no rendering state of its own; the overlay reads
//! [`Carousel::cards`] each frame and reports clicks back through
//! [`Carousel::select`] / [`Carousel::scroll_by`].

use crate::catalog::CatalogItem;

type SelectCallback = Box<dyn FnMut(&CatalogItem, usize)>;

/// Display data for one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Model name.
    pub title: String,
    /// Uppercase extension shown when there is no thumbnail.
    pub badge: String,
    /// `"EXT • size"`.
    pub subtitle: String,
    /// Thumbnail URL.
    pub thumb: Option<String>,
    /// Whether this is the selected card.
    pub active: bool,
}

impl Card {
    fn from_item(item: &CatalogItem) -> Self {
        Self {
            title: item.name.clone(),
            badge: item.ext.to_uppercase(),
            subtitle: item.subtitle(),
            thumb: item.thumbnail().map(str::to_owned),
            active: false,
        }
    }
}

/// Selectable list of catalog items with a single active card.
pub struct Carousel {
    items: Vec<CatalogItem>,
    cards: Vec<Card>,
    active_index: usize,
    scroll_request: Option<usize>,
    on_select: SelectCallback,
}

impl Carousel {
    /// Create an empty carousel. `on_select` fires with the item and its
    /// index every time a card is selected.
    pub fn new(on_select: impl FnMut(&CatalogItem, usize) + 'static) -> Self {
        Self {
            items: Vec::new(),
            cards: Vec::new(),
            active_index: 0,
            scroll_request: None,
            on_select: Box::new(on_select),
        }
    }

    /// Replace all items, rebuild the cards and select the first one.
    pub fn set_items(&mut self, items: &[CatalogItem]) {
        self.items = items.to_vec();
        self.cards = self.items.iter().map(Card::from_item).collect();
        self.active_index = 0;
        self.scroll_request = None;
        if !self.items.is_empty() {
            let _ = self.select(0);
        }
    }

    /// Make `index` the active card, invoke the selection callback and
    /// request that the card be scrolled into view. Returns `false` (and
    /// changes nothing) if `index` is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        let Some(item) = self.items.get(index) else {
            log::warn!(
                "Carousel index {index} out of range ({} items)",
                self.items.len()
            );
            return false;
        };
        self.active_index = index;
        for (i, card) in self.cards.iter_mut().enumerate() {
            card.active = i == index;
        }
        (self.on_select)(item, index);
        self.scroll_request = Some(index);
        true
    }

    /// Select the card `delta` positions away from the active one, clamped
    /// to the ends of the list.
    pub fn scroll_by(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        let next = self
            .active_index
            .saturating_add_signed(delta)
            .min(last);
        let _ = self.select(next);
    }

    /// Current items.
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Cards in display order.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Index of the active card.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Pending scroll-into-view target, cleared on read.
    pub fn take_scroll_request(&mut self) -> Option<usize> {
        self.scroll_request.take()
    }
}

impl std::fmt::Debug for Carousel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Carousel")
            .field("items", &self.items.len())
            .field("active_index", &self.active_index)
            .finish_non_exhaustive()
    }
}
