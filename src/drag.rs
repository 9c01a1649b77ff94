//! Drag-to-XPath transfer text
//!
//! Dragging a node name or attribute name produces an XPath snippet. The
//! variant is chosen by the held modifiers, or, in cycle mode, by a counter
//! that advances on every drag.

use crate::dom::XmlNode;

/// Modifier keys held when the drag started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
    /// Any variant with ctrl held produces nothing
    pub ctrl: bool,
}

impl Modifiers {
    pub fn meta() -> Self {
        Modifiers {
            meta: true,
            ..Default::default()
        }
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }
}

/// What is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget<'a> {
    NodeName,
    AttributeName(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Plain,
    Alt,
    Shift,
    ShiftAlt,
}

const CYCLE: [Variant; 4] = [Variant::Plain, Variant::Alt, Variant::Shift, Variant::ShiftAlt];

impl Variant {
    fn from_modifiers(mods: Modifiers) -> Option<Self> {
        if !mods.meta || mods.ctrl {
            return None;
        }
        Some(match (mods.shift, mods.alt) {
            (false, false) => Variant::Plain,
            (false, true) => Variant::Alt,
            (true, false) => Variant::Shift,
            (true, true) => Variant::ShiftAlt,
        })
    }
}

/// Transfer text generator
#[derive(Debug, Clone)]
pub struct DragXPath {
    quote: char,
    cycle_mode: bool,
    cycle: usize,
}

impl Default for DragXPath {
    fn default() -> Self {
        Self::new('\'', false)
    }
}

impl DragXPath {
    /// `quote` other than `"` falls back to `'`
    pub fn new(quote: char, cycle_mode: bool) -> Self {
        let quote = if quote == '"' { '"' } else { '\'' };
        DragXPath {
            quote,
            cycle_mode,
            cycle: 0,
        }
    }

    pub fn quote(&self) -> char {
        self.quote
    }

    pub fn cycle_mode(&self) -> bool {
        self.cycle_mode
    }

    /// Text placed on the drag payload; `None` when no variant applies
    pub fn transfer_text(&mut self, node: &XmlNode, target: DragTarget<'_>, mods: Modifiers) -> Option<String> {
        let variant = if self.cycle_mode {
            let variant = CYCLE[self.cycle % CYCLE.len()];
            self.cycle = self.cycle.wrapping_add(1);
            variant
        } else {
            Variant::from_modifiers(mods)?
        };

        if !node.is_element() {
            return None;
        }
        match target {
            DragTarget::NodeName => Some(self.node_name(node, variant)),
            DragTarget::AttributeName(name) => self.attribute_name(node, name, variant),
        }
    }

    fn node_name(&self, node: &XmlNode, variant: Variant) -> String {
        let attrs: Vec<String> = node
            .attributes()
            .iter()
            .filter(|a| !a.is_internal())
            .map(|a| match variant {
                Variant::Plain => String::new(),
                Variant::Alt => format!("@{}", a.name),
                Variant::Shift | Variant::ShiftAlt => format!("@{} = {}", a.name, self.quoted(&a.value)),
            })
            .collect();

        if variant == Variant::Plain || attrs.is_empty() {
            node.name().to_string()
        } else {
            format!("{}[{}]", node.name(), attrs.join(" and "))
        }
    }

    fn attribute_name(&self, node: &XmlNode, name: &str, variant: Variant) -> Option<String> {
        let value = node
            .attributes()
            .iter()
            .filter(|a| !a.is_internal())
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())?;

        Some(match variant {
            Variant::Plain => format!("@{}", name),
            Variant::Alt => format!("@{} = {}", name, self.quoted(value)),
            Variant::Shift => format!("{}[@{}]", node.name(), name),
            Variant::ShiftAlt => format!("{}[@{} = {}]", node.name(), name, self.quoted(value)),
        })
    }

    fn quoted(&self, value: &str) -> String {
        let escape = if self.quote == '"' { "&quot;" } else { "&apos;" };
        let q = self.quote;
        format!("{}{}{}", q, value.replace(q, escape), q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;

    fn item() -> XmlDocument {
        XmlDocument::parse(br#"<item id="a'1" kind="x" data-xv-id="3"/>"#).unwrap()
    }

    fn root(doc: &XmlDocument) -> &XmlNode {
        doc.node(doc.root_element().unwrap()).unwrap()
    }

    #[test]
    fn test_node_name_variants() {
        let doc = item();
        let node = root(&doc);
        let mut drag = DragXPath::default();
        let meta = Modifiers::meta();

        assert_eq!(drag.transfer_text(node, DragTarget::NodeName, meta).unwrap(), "item");
        assert_eq!(
            drag.transfer_text(node, DragTarget::NodeName, meta.with_alt()).unwrap(),
            "item[@id and @kind]"
        );
        let expected = "item[@id = 'a&apos;1' and @kind = 'x']";
        assert_eq!(drag.transfer_text(node, DragTarget::NodeName, meta.with_shift()).unwrap(), expected);
        assert_eq!(
            drag.transfer_text(node, DragTarget::NodeName, meta.with_shift().with_alt()).unwrap(),
            expected
        );
        assert_eq!(drag.transfer_text(node, DragTarget::NodeName, Modifiers::default()), None);
    }

    #[test]
    fn test_attribute_variants() {
        let doc = item();
        let node = root(&doc);
        let mut drag = DragXPath::new('"', false);
        let meta = Modifiers::meta();
        let target = DragTarget::AttributeName("kind");

        assert_eq!(drag.transfer_text(node, target, meta).unwrap(), "@kind");
        assert_eq!(drag.transfer_text(node, target, meta.with_alt()).unwrap(), "@kind = \"x\"");
        assert_eq!(drag.transfer_text(node, target, meta.with_shift()).unwrap(), "item[@kind]");
        assert_eq!(
            drag.transfer_text(node, target, meta.with_shift().with_alt()).unwrap(),
            "item[@kind = \"x\"]"
        );
        assert_eq!(drag.transfer_text(node, DragTarget::AttributeName("nope"), meta), None);
        assert_eq!(drag.transfer_text(node, DragTarget::AttributeName("data-xv-id"), meta), None);
    }

    #[test]
    fn test_ctrl_suppresses_transfer() {
        let doc = item();
        let node = root(&doc);
        let mut drag = DragXPath::default();
        let meta_ctrl = Modifiers::meta().with_ctrl();

        assert_eq!(drag.transfer_text(node, DragTarget::NodeName, meta_ctrl), None);
        assert_eq!(drag.transfer_text(node, DragTarget::NodeName, meta_ctrl.with_alt()), None);
        assert_eq!(drag.transfer_text(node, DragTarget::AttributeName("id"), meta_ctrl.with_shift()), None);
        assert_eq!(drag.transfer_text(node, DragTarget::NodeName, Modifiers::meta()).as_deref(), Some("item"));
    }

    #[test]
    fn test_element_without_attributes() {
        let doc = XmlDocument::parse(b"<bare/>").unwrap();
        let mut drag = DragXPath::default();
        let text = drag.transfer_text(root(&doc), DragTarget::NodeName, Modifiers::meta().with_alt());
        assert_eq!(text.unwrap(), "bare");
    }

    #[test]
    fn test_cycle_mode_ignores_modifiers() {
        let doc = item();
        let node = root(&doc);
        let mut drag = DragXPath::new('\'', true);
        let target = DragTarget::AttributeName("kind");
        let texts: Vec<String> = (0..5)
            .map(|_| drag.transfer_text(node, target, Modifiers::default()).unwrap())
            .collect();
        assert_eq!(
            texts,
            vec!["@kind", "@kind = 'x'", "item[@kind]", "item[@kind = 'x']", "@kind"]
        );
    }

    #[test]
    fn test_unknown_quote_falls_back() {
        assert_eq!(DragXPath::new('`', false).quote(), '\'');
    }
}
