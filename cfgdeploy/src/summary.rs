//! Contact summary data model.
//!
//! A contact summary is a document of the form `{cards, fields, context}`
//! that is rendered by the host application for a single contact. It is
//! usually produced by a compiled JavaScript program (see
//! [`crate::compile_contact_summary`]), but can also be resolved natively from
//! a [`SummaryDefinition`], which applies the same card and field rules.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A report associated with a contact. Reports are arbitrary JSON documents.
pub type Report = JsonValue;

/// The named values available to a contact summary while it is being
/// produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bindings {
    /// The contact whose summary is being produced.
    pub contact: JsonValue,
    /// The contact's ancestors, closest first.
    #[serde(default)]
    pub lineage: Vec<JsonValue>,
    /// Reports about the contact.
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl Bindings {
    pub fn new(contact: JsonValue) -> Self {
        Self {
            contact,
            ..Self::default()
        }
    }

    pub fn with_lineage(mut self, lineage: Vec<JsonValue>) -> Self {
        self.lineage = lineage;
        self
    }

    pub fn with_reports(mut self, reports: Vec<Report>) -> Self {
        self.reports = reports;
        self
    }

    /// The contact's type, if it has one.
    pub fn contact_type(&self) -> Option<&str> {
        self.contact.get("type").and_then(JsonValue::as_str)
    }

    /// The bindings in the order in which they're passed to a compiled
    /// program.
    pub fn named(&self) -> [(&'static str, JsonValue); 3] {
        [
            ("contact", self.contact.clone()),
            ("lineage", JsonValue::Array(self.lineage.clone())),
            ("reports", JsonValue::Array(self.reports.clone())),
        ]
    }
}

/// The names of the bindings, as seen by compiled programs.
pub const BINDING_NAMES: [&str; 3] = ["contact", "lineage", "reports"];

/// Returns whether a report is usable for building cards.
///
/// Reports submitted from XML forms have no `errors` field, whereas reports
/// submitted as JSON always carry one, which is empty when the report is
/// valid.
pub fn is_report_valid(report: &Report) -> bool {
    if !is_truthy(report) {
        return false;
    }
    match report.get("errors") {
        Some(JsonValue::Array(errors)) => errors.is_empty(),
        Some(JsonValue::String(errors)) => errors.is_empty(),
        _ => true,
    }
}

/// JavaScript's notion of truthiness, applied to JSON values.
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// A single card in a contact summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<JsonValue>,
    #[serde(default)]
    pub fields: Vec<JsonValue>,
}

/// The result of evaluating a contact summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactSummary {
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub fields: Vec<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonValue>,
}

type ComputeFn = Box<dyn Fn(Option<&Report>) -> JsonValue>;

/// An attribute whose value is either fixed, or computed from the report for
/// which a card is being built.
pub enum Attribute {
    Literal(JsonValue),
    Computed(ComputeFn),
}

impl Attribute {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(Option<&Report>) -> JsonValue + 'static,
    {
        Self::Computed(Box::new(f))
    }

    /// Resolve this attribute to a plain value.
    pub fn resolve(&self, report: Option<&Report>) -> JsonValue {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Computed(f) => f(report),
        }
    }

    /// Resolve this attribute and judge the result by its truthiness.
    pub fn holds(&self, report: Option<&Report>) -> bool {
        is_truthy(&self.resolve(report))
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "Literal({})", v),
            Self::Computed(_) => write!(f, "Computed(..)"),
        }
    }
}

macro_rules! literal_attribute_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Attribute {
                fn from(v: $t) -> Self {
                    Self::Literal(v.into())
                }
            }
        )*
    };
}

literal_attribute_from!(JsonValue, bool, &str, String, i32, i64, u64, f64);

/// Optional `count`/`total` context of a field.
#[derive(Debug, Default)]
pub struct FieldContext {
    pub count: Option<Attribute>,
    pub total: Option<Attribute>,
}

/// Describes a field, either at the top level of a contact summary or within
/// a card.
#[derive(Debug, Default)]
pub struct FieldDescriptor {
    /// The contact type to which a top-level field applies. A leading `!`
    /// negates the match. Ignored for card fields.
    pub applies_to_type: Option<String>,
    pub applies_if: Option<Attribute>,
    pub label: Option<Attribute>,
    pub value: Option<Attribute>,
    pub translate: Option<Attribute>,
    pub filter: Option<Attribute>,
    pub width: Option<Attribute>,
    pub icon: Option<Attribute>,
    pub context: Option<FieldContext>,
}

impl FieldDescriptor {
    /// Returns whether this top-level field is shown for contacts of the
    /// given type.
    pub fn applies_to(&self, contact_type: Option<&str>) -> bool {
        match self.applies_to_type.as_deref() {
            Some(t) if Some(t) == contact_type => true,
            Some(t) => match t.strip_prefix('!') {
                Some(negated) => Some(negated) != contact_type,
                None => false,
            },
            None => false,
        }
    }

    fn applies(&self, report: Option<&Report>) -> bool {
        self.applies_if
            .as_ref()
            .map(|predicate| predicate.holds(report))
            .unwrap_or(true)
    }

    /// Resolves every attribute of this field against the given report,
    /// omitting those that aren't defined.
    pub fn resolve(&self, report: Option<&Report>) -> JsonValue {
        let mut resolved = Map::new();
        let attributes = [
            ("label", &self.label),
            ("value", &self.value),
            ("translate", &self.translate),
            ("filter", &self.filter),
            ("width", &self.width),
            ("icon", &self.icon),
        ];
        for (name, attribute) in attributes {
            if let Some(attribute) = attribute {
                resolved.insert(name.to_string(), attribute.resolve(report));
            }
        }
        if let Some(context) = &self.context {
            let mut resolved_context = Map::new();
            for (name, attribute) in [("count", &context.count), ("total", &context.total)] {
                if let Some(attribute) = attribute {
                    resolved_context.insert(name.to_string(), attribute.resolve(report));
                }
            }
            resolved.insert("context".to_string(), JsonValue::Object(resolved_context));
        }
        JsonValue::Object(resolved)
    }
}

type FieldsFn = Box<dyn Fn(Option<&Report>) -> Vec<JsonValue>>;
type ModifyContextFn = Box<dyn Fn(&mut Map<String, JsonValue>, Option<&Report>)>;

/// The fields of a card.
pub enum CardFields {
    List(Vec<FieldDescriptor>),
    /// Produces already-resolved fields for the given report.
    Computed(FieldsFn),
}

impl std::fmt::Debug for CardFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List(fields) => f.debug_tuple("List").field(fields).finish(),
            Self::Computed(_) => write!(f, "Computed(..)"),
        }
    }
}

/// Type of contact (or `"report"`) to which a card applies.
pub const REPORT_CARD: &str = "report";

/// Describes a card. Cards that apply to [`REPORT_CARD`] are built once per
/// valid report, and all others at most once for the contact itself.
pub struct CardDescriptor {
    pub label: Option<JsonValue>,
    pub applies_to_type: String,
    pub applies_if: Attribute,
    pub fields: CardFields,
    pub modify_context: Option<ModifyContextFn>,
}

impl CardDescriptor {
    /// Every card needs a predicate. Pass `true.into()` for cards that always
    /// apply.
    pub fn new<L, T>(
        label: L,
        applies_to_type: T,
        applies_if: Attribute,
        fields: CardFields,
    ) -> Self
    where
        L: Into<JsonValue>,
        T: Into<String>,
    {
        Self {
            label: Some(label.into()),
            applies_to_type: applies_to_type.into(),
            applies_if,
            fields,
            modify_context: None,
        }
    }

    pub fn modify_context<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Map<String, JsonValue>, Option<&Report>) + 'static,
    {
        self.modify_context = Some(Box::new(f));
        self
    }

    fn build(
        &self,
        report: Option<&Report>,
        cards: &mut Vec<Card>,
        context: &mut Map<String, JsonValue>,
    ) {
        if !self.applies_if.holds(report) {
            return;
        }
        let fields = match &self.fields {
            CardFields::Computed(f) => f(report),
            CardFields::List(fields) => fields
                .iter()
                .filter(|field| field.applies(report))
                .map(|field| field.resolve(report))
                .collect(),
        };
        cards.push(Card {
            label: self.label.clone(),
            fields,
        });
        if let Some(modify_context) = &self.modify_context {
            modify_context(context, report);
        }
    }
}

impl std::fmt::Debug for CardDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDescriptor")
            .field("label", &self.label)
            .field("applies_to_type", &self.applies_to_type)
            .field("applies_if", &self.applies_if)
            .field("fields", &self.fields)
            .finish()
    }
}

/// A structured contact summary definition: top-level fields, cards and the
/// initial context shared by all cards.
#[derive(Debug, Default)]
pub struct SummaryDefinition {
    pub fields: Vec<FieldDescriptor>,
    pub cards: Vec<CardDescriptor>,
    pub context: Map<String, JsonValue>,
}

impl SummaryDefinition {
    /// Produces the contact summary for the given bindings.
    pub fn resolve(&self, bindings: &Bindings) -> ContactSummary {
        let contact_type = bindings.contact_type();
        let fields = self
            .fields
            .iter()
            .filter(|field| field.applies_to(contact_type) && field.applies(None))
            .map(|field| field.resolve(None))
            .collect();

        let mut cards = Vec::new();
        let mut context = self.context.clone();
        for card in &self.cards {
            if card.applies_to_type == REPORT_CARD {
                for report in bindings.reports.iter().filter(|r| is_report_valid(r)) {
                    card.build(Some(report), &mut cards, &mut context);
                }
            } else if Some(card.applies_to_type.as_str()) == contact_type {
                card.build(None, &mut cards, &mut context);
            }
        }

        ContactSummary {
            cards,
            fields,
            context: Some(JsonValue::Object(context)),
        }
    }
}
