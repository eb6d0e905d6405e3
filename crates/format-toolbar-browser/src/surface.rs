//! Browser implementation of the surface platform traits.
//!
//! Uses the DOM Selection API for capture/restore and the document's native
//! `execCommand` / `queryCommandState` as the formatting primitive.

use smol_str::SmolStr;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlDocument, HtmlElement, Node, Range, Selection};

use format_toolbar_core::{
    Format, FormatPlatform, PlatformError, RangeHandle, SelectionPlatform, SyncConfig,
};

/// A cloned DOM range.
#[derive(Clone, Debug)]
pub struct DomRange(pub Range);

impl DomRange {
    pub fn range(&self) -> &Range {
        &self.0
    }
}

impl RangeHandle for DomRange {
    fn is_collapsed(&self) -> bool {
        self.0.collapsed()
    }
}

/// A contenteditable element acting as the editable surface.
pub struct BrowserSurface {
    element: HtmlElement,
    document: Document,
    placeholder: SmolStr,
}

impl BrowserSurface {
    /// Bind to `element`. Fails when the element is not in a document.
    pub fn new(element: HtmlElement, config: &SyncConfig) -> Result<Self, PlatformError> {
        let document = element
            .owner_document()
            .ok_or("surface element has no owner document")?;
        Ok(Self {
            element,
            document,
            placeholder: config.placeholder.clone(),
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Whether `node` is inside the surface, either directly or, for a text
    /// node, through its parent element.
    pub fn contains_node(&self, node: &Node) -> bool {
        let root: &Node = self.element.as_ref();
        if root.contains(Some(node)) {
            return true;
        }
        node.node_type() == Node::TEXT_NODE
            && node
                .parent_node()
                .is_some_and(|parent| root.contains(Some(&parent)))
    }

    fn selection(&self) -> Result<Selection, PlatformError> {
        self.document
            .get_selection()
            .map_err(|e| format!("get_selection failed: {:?}", e))?
            .ok_or_else(|| "no selection object".into())
    }

    fn html_document(&self) -> Result<&HtmlDocument, PlatformError> {
        self.document
            .dyn_ref::<HtmlDocument>()
            .ok_or_else(|| "document is not an HTML document".into())
    }

    fn live_range_in_surface(&self) -> Result<DomRange, PlatformError> {
        self.live_range()
            .filter(|range| self.contains_range(range))
            .ok_or_else(|| "selection is not inside the editable surface".into())
    }

    fn exec(&self, command: &str) -> Result<(), PlatformError> {
        match self.html_document()?.exec_command(command) {
            Ok(true) => Ok(()),
            Ok(false) => Err(format!("execCommand({command}) was not applied").into()),
            Err(e) => Err(format!("execCommand({command}) failed: {:?}", e).into()),
        }
    }

    fn set_live(&self, range: &Range) -> Result<(), PlatformError> {
        let selection = self.selection()?;
        selection
            .remove_all_ranges()
            .map_err(|e| format!("remove_all_ranges failed: {:?}", e))?;
        selection
            .add_range(range)
            .map_err(|e| format!("add_range failed: {:?}", e))?;
        Ok(())
    }

    /// Insert the placeholder at a collapsed caret and select it, so the
    /// native command has text to wrap.
    fn insert_placeholder(&self, caret: &Range) -> Result<(), PlatformError> {
        let text = self.document.create_text_node(&self.placeholder);
        caret
            .insert_node(&text)
            .map_err(|e| format!("insert_node failed: {:?}", e))?;
        caret
            .select_node_contents(&text)
            .map_err(|e| format!("select_node_contents failed: {:?}", e))?;
        self.set_live(caret)
    }

    fn collapse_to_end(&self) {
        if let Ok(selection) = self.selection() {
            if let Err(e) = selection.collapse_to_end() {
                tracing::debug!(target: "format_toolbar::browser", "collapse_to_end failed: {:?}", e);
            }
        }
    }
}

impl SelectionPlatform for BrowserSurface {
    type Range = DomRange;

    fn live_range(&self) -> Option<DomRange> {
        let selection = self.selection().ok()?;
        if selection.range_count() == 0 {
            return None;
        }
        selection
            .get_range_at(0)
            .ok()
            .map(|r| DomRange(r.clone_range()))
    }

    fn contains_range(&self, range: &DomRange) -> bool {
        match range.0.common_ancestor_container() {
            Ok(node) => self.contains_node(&node),
            Err(e) => {
                tracing::trace!(target: "format_toolbar::browser", "commonAncestorContainer failed: {:?}", e);
                false
            }
        }
    }

    fn select_range(&mut self, range: &DomRange) -> Result<(), PlatformError> {
        let range = range.range();
        let start = range
            .start_container()
            .map_err(|e| format!("start_container failed: {:?}", e))?;
        let end = range
            .end_container()
            .map_err(|e| format!("end_container failed: {:?}", e))?;
        if !start.is_connected() || !end.is_connected() {
            return Err("range refers to nodes that were removed".into());
        }
        // Removing nodes moves live ranges up to the nearest surviving parent,
        // which may be outside the surface.
        if !self.contains_node(&start) || !self.contains_node(&end) {
            return Err("range is no longer inside the editable surface".into());
        }
        self.set_live(&range.clone_range())
    }
}

impl FormatPlatform for BrowserSurface {
    fn is_focused(&self) -> bool {
        let Some(active) = self.document.active_element() else {
            return false;
        };
        let root: &Node = self.element.as_ref();
        let active: &Node = active.as_ref();
        root.contains(Some(active))
    }

    fn focus(&mut self) -> Result<(), PlatformError> {
        self.element
            .focus()
            .map_err(|e| format!("focus failed: {:?}", e).into())
    }

    fn toggle_format(&mut self, format: Format) -> Result<(), PlatformError> {
        let range = self.live_range_in_surface()?;
        let at_caret = range.is_collapsed();
        if at_caret {
            self.insert_placeholder(range.range())?;
        }

        self.exec(format.command_name())?;

        if at_caret {
            self.collapse_to_end();
        }
        Ok(())
    }

    fn clear_formats(&mut self, formats: &[Format]) -> Result<(), PlatformError> {
        // removeFormat has nothing to act on at a caret; there only the
        // per-format commands switch the typing style off.
        if !self.live_range_in_surface()?.is_collapsed() {
            self.exec("removeFormat")?;
        }

        // removeFormat leaves some styling behind in some engines.
        for format in formats {
            if self.query_format(*format) {
                self.exec(format.command_name())?;
            }
        }

        let remaining: Vec<&str> = formats
            .iter()
            .filter(|format| self.query_format(**format))
            .map(|format| format.id())
            .collect();
        if !remaining.is_empty() {
            return Err(format!("still active after clear: {}", remaining.join(", ")).into());
        }
        Ok(())
    }

    fn query_format(&self, format: Format) -> bool {
        if self.live_range_in_surface().is_err() {
            return false;
        }
        self.html_document()
            .ok()
            .and_then(|doc| doc.query_command_state(format.command_name()).ok())
            .unwrap_or(false)
    }

    fn serialized_content(&self) -> String {
        self.element.inner_html()
    }
}
