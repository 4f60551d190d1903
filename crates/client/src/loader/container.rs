//! In-memory model of the list container the loader renders into.

use edgecache_core::Error;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

/// What a child node of the container is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A list item, matched by the item selector.
    Item,
    /// Anything else the page put in the container (headings, filters).
    Chrome,
    /// An error banner inserted by the loader.
    Banner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: u64,
    pub kind: NodeKind,
    /// Outer HTML.
    pub html: String,
    pub text: String,
    /// Delay before the reveal animation starts; set once an item has been revealed.
    pub reveal_delay: Option<Duration>,
}

/// The "load more" button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMoreControl {
    pub visible: bool,
    pub enabled: bool,
    pub label: String,
}

impl Default for LoadMoreControl {
    fn default() -> Self {
        Self { visible: true, enabled: true, label: LOAD_MORE_LABEL.to_string() }
    }
}

const LOAD_MORE_LABEL: &str = "Load more";
const LOADING_LABEL: &str = "Loading...";

/// The container's children plus the controls around it.
#[derive(Debug, Clone)]
pub struct Container {
    item_selector: Selector,
    nodes: Vec<Node>,
    next_id: u64,
    reveal_stagger: Duration,
    pub load_more: LoadMoreControl,
    pub loading_indicator: bool,
    pub counter: String,
}

impl Container {
    /// An empty container whose items match `item_selector`.
    pub fn new(item_selector: &str) -> Result<Self, Error> {
        let item_selector = Selector::parse(item_selector)
            .map_err(|e| Error::InvalidInput(format!("invalid item selector {item_selector}: {e}")))?;

        let mut container = Self {
            item_selector,
            nodes: Vec::new(),
            next_id: 0,
            reveal_stagger: Duration::from_millis(50),
            load_more: LoadMoreControl::default(),
            loading_indicator: false,
            counter: String::new(),
        };
        container.update_counter();
        Ok(container)
    }

    /// Import the children of the first `[data-progressive-container]` in `html`.
    ///
    /// Imported items count as already revealed.
    pub fn from_html(html: &str, item_selector: &str) -> Result<Self, Error> {
        let mut container = Self::new(item_selector)?;
        let document = Html::parse_document(html);
        let selector = Selector::parse("[data-progressive-container]")
            .map_err(|e| Error::InvalidInput(format!("invalid container selector: {e}")))?;

        let root = document
            .select(&selector)
            .next()
            .ok_or_else(|| Error::InvalidInput("no [data-progressive-container] element".into()))?;
        container.import(root);
        for node in container.nodes.iter_mut().filter(|n| n.kind == NodeKind::Item) {
            node.reveal_delay = Some(Duration::ZERO);
        }
        container.update_counter();
        Ok(container)
    }

    pub fn with_reveal_stagger(mut self, stagger: Duration) -> Self {
        self.reveal_stagger = stagger;
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn items(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Item)
    }

    pub fn item_count(&self) -> usize {
        self.items().count()
    }

    pub fn item_texts(&self) -> Vec<String> {
        self.items().map(|n| n.text.clone()).collect()
    }

    /// Text of every banner currently shown.
    pub fn banners(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Banner)
            .map(|n| n.text.clone())
            .collect()
    }

    /// Append the top-level elements of a fragment and reveal new items.
    ///
    /// Returns the number of items added.
    pub fn append_fragment(&mut self, html: &str) -> usize {
        if html.trim().is_empty() {
            return 0;
        }
        let before = self.item_count();
        let fragment = Html::parse_fragment(html);
        self.import(fragment.root_element());
        self.reveal_new_items();
        self.item_count() - before
    }

    /// Remove every item, keep chrome and banners, then append the fragment.
    pub fn replace_items(&mut self, html: &str) -> usize {
        self.nodes.retain(|n| n.kind != NodeKind::Item);
        self.append_fragment(html)
    }

    fn import(&mut self, parent: ElementRef<'_>) {
        for child in parent.children().filter_map(ElementRef::wrap) {
            let kind = if self.item_selector.matches(&child) { NodeKind::Item } else { NodeKind::Chrome };
            let node = self.node(kind, child.html(), child.text().collect::<String>().trim().to_string());
            self.nodes.push(node);
        }
    }

    fn node(&mut self, kind: NodeKind, html: String, text: String) -> Node {
        self.next_id += 1;
        Node { id: self.next_id, kind, html, text, reveal_delay: None }
    }

    /// Give every not-yet-revealed item a staggered reveal delay.
    fn reveal_new_items(&mut self) {
        let stagger = self.reveal_stagger;
        let unrevealed = self
            .nodes
            .iter_mut()
            .filter(|n| n.kind == NodeKind::Item && n.reveal_delay.is_none());
        for (index, node) in unrevealed.enumerate() {
            node.reveal_delay = Some(stagger * index as u32);
        }
    }

    /// Insert an error banner as the first child. Returns its id.
    pub fn insert_banner(&mut self, message: &str) -> u64 {
        let html = format!(
            r#"<div class="alert alert-danger alert-dismissible fade show" role="alert">{}<button type="button" class="btn-close" data-bs-dismiss="alert"></button></div>"#,
            escape_html(message)
        );
        let node = self.node(NodeKind::Banner, html, message.to_string());
        let id = node.id;
        self.nodes.insert(0, node);
        id
    }

    /// Remove a banner; false if it was already gone.
    pub fn remove_banner(&mut self, id: u64) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| !(n.id == id && n.kind == NodeKind::Banner));
        self.nodes.len() != before
    }

    pub fn show_loading(&mut self) {
        self.loading_indicator = true;
        self.load_more.enabled = false;
        self.load_more.label = LOADING_LABEL.to_string();
    }

    pub fn hide_loading(&mut self) {
        self.loading_indicator = false;
    }

    /// Sync the load-more control and the item counter with the state.
    pub fn refresh_controls(&mut self, has_more: bool, loading: bool) {
        if !has_more {
            self.load_more.visible = false;
        } else if !loading {
            self.load_more = LoadMoreControl::default();
        }
        self.update_counter();
    }

    fn update_counter(&mut self) {
        self.counter = format!("{} item(s) shown", self.item_count());
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div data-progressive-container data-endpoint="/api/items">
            <h2 class="title">Campaigns</h2>
            <div class="list-item">One</div>
            <div class="list-item">Two</div>
        </div>
    "#;

    #[test]
    fn test_from_html_imports_children() {
        let container = Container::from_html(PAGE, ".list-item").unwrap();
        assert_eq!(container.nodes().len(), 3);
        assert_eq!(container.nodes()[0].kind, NodeKind::Chrome);
        assert_eq!(container.item_texts(), vec!["One", "Two"]);
        assert_eq!(container.counter, "2 item(s) shown");
    }

    #[test]
    fn test_missing_container() {
        assert!(matches!(Container::from_html("<div></div>", ".list-item"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_selector() {
        assert!(Container::new("[[").is_err());
    }

    #[test]
    fn test_append_staggers_new_items_only() {
        let mut container = Container::from_html(PAGE, ".list-item").unwrap();
        let added = container.append_fragment(r#"<div class="list-item">Three</div><div class="list-item">Four</div>"#);

        assert_eq!(added, 2);
        let delays: Vec<_> = container.items().map(|n| n.reveal_delay).collect();
        assert_eq!(delays[2], Some(Duration::from_millis(0)));
        assert_eq!(delays[3], Some(Duration::from_millis(50)));

        container.append_fragment(r#"<div class="list-item">Five</div>"#);
        assert_eq!(container.items().last().unwrap().reveal_delay, Some(Duration::ZERO));
        assert_eq!(container.items().nth(3).unwrap().reveal_delay, Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_append_empty_fragment() {
        let mut container = Container::new(".list-item").unwrap();
        assert_eq!(container.append_fragment("   "), 0);
        assert!(container.nodes().is_empty());
    }

    #[test]
    fn test_replace_keeps_chrome() {
        let mut container = Container::from_html(PAGE, ".list-item").unwrap();
        container.replace_items(r#"<div class="list-item">Fresh</div>"#);

        assert_eq!(container.item_texts(), vec!["Fresh"]);
        assert_eq!(container.nodes()[0].text, "Campaigns");
    }

    #[test]
    fn test_banner_is_first_and_escaped() {
        let mut container = Container::from_html(PAGE, ".list-item").unwrap();
        let id = container.insert_banner("<boom>");

        assert_eq!(container.nodes()[0].kind, NodeKind::Banner);
        assert!(container.nodes()[0].html.contains("&lt;boom&gt;"));
        assert_eq!(container.banners(), vec!["<boom>"]);

        assert!(container.remove_banner(id));
        assert!(!container.remove_banner(id));
        assert!(container.banners().is_empty());
    }

    #[test]
    fn test_controls() {
        let mut container = Container::new(".list-item").unwrap();
        container.show_loading();
        assert!(container.loading_indicator);
        assert!(!container.load_more.enabled);
        assert_eq!(container.load_more.label, "Loading...");

        container.hide_loading();
        container.refresh_controls(true, false);
        assert!(container.load_more.visible && container.load_more.enabled);
        assert_eq!(container.load_more.label, "Load more");

        container.refresh_controls(false, false);
        assert!(!container.load_more.visible);
    }
}
