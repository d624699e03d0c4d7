/// Native core-type tags for the component kinds the bridge distinguishes.
pub mod type_tag {
    /// Custom number property.
    pub const NUMBER_PROPERTY: u16 = 127;
    /// Plain event.
    pub const EVENT: u16 = 128;
    /// Custom boolean property.
    pub const BOOLEAN_PROPERTY: u16 = 129;
    /// Custom string property.
    pub const STRING_PROPERTY: u16 = 130;
    /// Event that asks the host to open a URL.
    pub const OPEN_URL_EVENT: u16 = 131;
}

#[derive(Clone, Debug, PartialEq)]
/// One named node of an artboard's component tree.
pub struct Component {
    /// Component name as authored.
    pub name: String,
    /// Resolved kind.
    pub kind: ComponentKind,
}

#[derive(Clone, Debug, PartialEq)]
/// Closed set of component kinds, resolved once when the component tree is read.
pub enum ComponentKind {
    /// An event; `properties` are its direct children.
    Event {
        /// Native core type (plain or open-URL event).
        type_tag: u16,
        /// Child components. Only custom properties contribute to payloads.
        properties: Vec<Component>,
    },
    /// Custom boolean property.
    BooleanProperty(bool),
    /// Custom number property.
    NumberProperty(f32),
    /// Custom string property.
    StringProperty(String),
    /// Anything else (shapes, bones, groups...).
    Other {
        /// Native core type.
        type_tag: u16,
    },
}

impl ComponentKind {
    /// Native core type of this kind.
    pub fn type_tag(&self) -> u16 {
        match self {
            Self::Event { type_tag, .. } | Self::Other { type_tag } => *type_tag,
            Self::BooleanProperty(_) => type_tag::BOOLEAN_PROPERTY,
            Self::NumberProperty(_) => type_tag::NUMBER_PROPERTY,
            Self::StringProperty(_) => type_tag::STRING_PROPERTY,
        }
    }

    /// `true` for custom boolean, number and string properties.
    pub fn is_property(&self) -> bool {
        matches!(
            self,
            Self::BooleanProperty(_) | Self::NumberProperty(_) | Self::StringProperty(_)
        )
    }
}

impl Component {
    /// Plain event with the given child components.
    pub fn event(name: impl Into<String>, properties: Vec<Component>) -> Self {
        Self {
            name: name.into(),
            kind: ComponentKind::Event {
                type_tag: type_tag::EVENT,
                properties,
            },
        }
    }

    /// Custom boolean property.
    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            kind: ComponentKind::BooleanProperty(value),
        }
    }

    /// Custom number property.
    pub fn number(name: impl Into<String>, value: f32) -> Self {
        Self {
            name: name.into(),
            kind: ComponentKind::NumberProperty(value),
        }
    }

    /// Custom string property.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ComponentKind::StringProperty(value.into()),
        }
    }

    /// `true` when this component is an event of any flavor.
    pub fn is_event(&self) -> bool {
        matches!(self.kind, ComponentKind::Event { .. })
    }
}
