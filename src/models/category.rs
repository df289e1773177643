use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CategoryKind {
    Income,
    Expense,
    Savings,
}

impl CategoryKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Savings => "savings",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "savings" | "saving" => Some(Self::Savings),
            _ => None,
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an expense category counts as a need or a want.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SpendNature {
    Needs,
    Wants,
}

impl SpendNature {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Needs => "needs",
            Self::Wants => "wants",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "needs" | "need" => Some(Self::Needs),
            "wants" | "want" => Some(Self::Wants),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpendNature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Category {
    pub id: Option<i64>,
    pub kind: CategoryKind,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    /// Only ever set for expense categories.
    pub nature: Option<SpendNature>,
}

impl Category {
    /// Expense categories default to `needs` when no nature is given; other
    /// kinds never carry one.
    pub(crate) fn new(kind: CategoryKind, name: String, nature: Option<SpendNature>) -> Self {
        let nature = match kind {
            CategoryKind::Expense => Some(nature.unwrap_or(SpendNature::Needs)),
            CategoryKind::Income | CategoryKind::Savings => None,
        };
        Self {
            id: None,
            kind,
            slug: slugify(&name),
            name,
            parent_id: None,
            nature,
        }
    }

    pub(crate) fn with_parent(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Find a category by ID in a slice.
    pub(crate) fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == Some(id))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' | 'ń' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' | 'ś' => 's',
        'ž' | 'ź' | 'ż' => 'z',
        other => other,
    }
}

/// Derive the identifier of a category from its display name.
/// e.g. `"Alimentação & Casa"` → `"alimentacao-casa"`
pub(crate) fn slugify(name: &str) -> String {
    static NON_ALNUM: OnceLock<Option<Regex>> = OnceLock::new();
    let folded: String = name.to_lowercase().chars().map(fold_diacritic).collect();
    let dashed = match NON_ALNUM.get_or_init(|| Regex::new("[^a-z0-9]+").ok()) {
        Some(re) => re.replace_all(&folded, "-").into_owned(),
        None => folded,
    };
    dashed.trim_matches('-').to_string()
}

/// One category with its children, for display as a tree.
#[derive(Debug, Clone)]
pub(crate) struct CategoryNode {
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// Arrange categories into a forest. Siblings are sorted by name; a child
/// whose parent is missing is promoted to a root.
pub(crate) fn build_tree(categories: &[Category]) -> Vec<CategoryNode> {
    let known: Vec<i64> = categories.iter().filter_map(|c| c.id).collect();
    let mut by_parent: HashMap<Option<i64>, Vec<&Category>> = HashMap::new();
    for cat in categories {
        let parent = cat
            .parent_id
            .filter(|p| known.contains(p) && Some(*p) != cat.id);
        by_parent.entry(parent).or_default().push(cat);
    }
    attach(None, &by_parent)
}

fn attach(
    parent: Option<i64>,
    by_parent: &HashMap<Option<i64>, Vec<&Category>>,
) -> Vec<CategoryNode> {
    let Some(children) = by_parent.get(&parent) else {
        return Vec::new();
    };
    let mut nodes: Vec<CategoryNode> = children
        .iter()
        .map(|c| CategoryNode {
            category: (*c).clone(),
            children: match c.id {
                Some(id) => attach(Some(id), by_parent),
                None => Vec::new(),
            },
        })
        .collect();
    nodes.sort_by(|a, b| a.category.name.to_lowercase().cmp(&b.category.name.to_lowercase()));
    nodes
}
