// Module registry: the static list of screens a tab can host.
// Loaded once at startup and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModuleColor {
    Primary,
    Success,
    Warning,
    Danger,
    Info,
    Secondary,
    Purple,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub path: String,
    pub color: ModuleColor,
    #[serde(default)]
    pub is_main: bool,
    pub description: String,
    /// Locale key ("english", "french", ...) to localized name.
    #[serde(default)]
    pub names: BTreeMap<String, String>,
}

impl ModuleDescriptor {
    /// Localized name, falling back to the title.
    pub fn display_name(&self, locale: &str) -> &str {
        self.names
            .get(locale)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    /// Builds a registry, rejecting duplicate ids.
    pub fn new(modules: Vec<ModuleDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for module in &modules {
            if !seen.insert(module.id.as_str()) {
                return Err(Error::DuplicateModule(module.id.clone()));
            }
        }
        Ok(Self { modules })
    }

    /// Reads a JSON array of module descriptors.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let modules: Vec<ModuleDescriptor> = serde_json::from_str(&content)?;
        log::info!("[Registry] Loaded {} modules from {}", modules.len(), path.display());
        Self::new(modules)
    }

    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The modules shipped with the application.
    pub fn builtin() -> Self {
        Self {
            modules: BUILTIN
                .iter()
                .map(|b| ModuleDescriptor {
                    id: b.id.to_string(),
                    title: b.title.to_string(),
                    icon: b.icon.to_string(),
                    path: format!("/{}", b.id),
                    color: b.color,
                    is_main: b.is_main,
                    description: b.description.to_string(),
                    names: LOCALES
                        .iter()
                        .zip(b.names.iter())
                        .map(|(locale, name)| (locale.to_string(), name.to_string()))
                        .collect(),
                })
                .collect(),
        }
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

struct Builtin {
    id: &'static str,
    title: &'static str,
    icon: &'static str,
    color: ModuleColor,
    is_main: bool,
    description: &'static str,
    names: [&'static str; 5],
}

const LOCALES: [&str; 5] = ["french", "english", "spanish", "chinese", "hindi"];

const BUILTIN: &[Builtin] = &[
    Builtin {
        id: "pos",
        title: "Point of Sale",
        icon: "CreditCard",
        color: ModuleColor::Primary,
        is_main: true,
        description: "Sales and order management",
        names: ["Point de Vente", "POS", "Punto de Venta", "销售点", "बिक्री बिंदु"],
    },
    Builtin {
        id: "tables",
        title: "Tables",
        icon: "Table",
        color: ModuleColor::Success,
        is_main: false,
        description: "Table management",
        names: ["Tables", "Tables", "Mesas", "餐桌", "मेज़"],
    },
    Builtin {
        id: "orders",
        title: "Orders",
        icon: "ChefHat",
        color: ModuleColor::Warning,
        is_main: false,
        description: "Kitchen order management",
        names: ["Commandes", "Orders", "Pedidos", "订单", "आदेश"],
    },
    Builtin {
        id: "planner",
        title: "Planner",
        icon: "Layout",
        color: ModuleColor::Info,
        is_main: false,
        description: "Floor planning",
        names: ["Planificateur", "Planner", "Planificador", "规划", "योजनाकार"],
    },
    Builtin {
        id: "products",
        title: "Products",
        icon: "Package",
        color: ModuleColor::Warning,
        is_main: false,
        description: "Product management",
        names: ["Produits", "Products", "Productos", "产品", "उत्पाद"],
    },
    Builtin {
        id: "categories",
        title: "Categories",
        icon: "Tags",
        color: ModuleColor::Info,
        is_main: false,
        description: "Category management",
        names: ["Catégories", "Categories", "Categorías", "分类", "श्रेणियां"],
    },
    Builtin {
        id: "logs",
        title: "Logs",
        icon: "FileText",
        color: ModuleColor::Secondary,
        is_main: false,
        description: "Event history",
        names: ["Journaux", "Logs", "Registros", "日志", "लॉग"],
    },
    Builtin {
        id: "reports",
        title: "Reports",
        icon: "BarChart3",
        color: ModuleColor::Secondary,
        is_main: false,
        description: "Analytics and statistics",
        names: ["Rapports", "Reports", "Reportes", "报告", "रिपोर्ट"],
    },
    Builtin {
        id: "auditguard",
        title: "AuditGuard",
        icon: "Shield",
        color: ModuleColor::Danger,
        is_main: false,
        description: "Fraud detection and compliance",
        names: ["AuditGuard", "AuditGuard", "AuditGuard", "审计", "ऑडिटगार्ड"],
    },
    Builtin {
        id: "menugpt",
        title: "MenuGPT",
        icon: "Brain",
        color: ModuleColor::Purple,
        is_main: false,
        description: "Analyze your menus and automatically create your products",
        names: ["MenuGPT", "MenuGPT", "MenuGPT", "菜单GPT", "मेन्यूजीपीटी"],
    },
    Builtin {
        id: "settings",
        title: "Settings",
        icon: "Settings",
        color: ModuleColor::Danger,
        is_main: false,
        description: "System configuration",
        names: ["Paramètres", "Settings", "Configuración", "设置", "सेटिंग्स"],
    },
    Builtin {
        id: "masterstocks",
        title: "MasterStocks",
        icon: "Warehouse",
        color: ModuleColor::Success,
        is_main: false,
        description: "Stock management and inventory control",
        names: ["Stocks Maîtres", "MasterStocks", "Stocks Maestros", "主库存", "मास्टर स्टॉक्स"],
    },
    Builtin {
        id: "smsticket",
        title: "SMSTicket",
        icon: "MessageSquare",
        color: ModuleColor::Info,
        is_main: false,
        description: "SMS notifications and ticket management",
        names: ["Billet SMS", "SMSTicket", "Boleto SMS", "短信票", "एसएमएस टिकट"],
    },
];

#[cfg(test)]
pub(crate) fn test_module(id: &str, title: &str) -> ModuleDescriptor {
    ModuleDescriptor {
        id: id.to_string(),
        title: title.to_string(),
        icon: "Box".to_string(),
        path: format!("/{}", id),
        color: ModuleColor::Primary,
        is_main: false,
        description: String::new(),
        names: BTreeMap::new(),
    }
}
