use clap::{ArgGroup, Args, Parser, Subcommand};
use godown::filter::ItemFilter;
use godown::model::{ItemDraft, LocationDraft};

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.2" for releases, "0.3.2@abc1234 2024-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "godown", bin_name = "godown", version = get_version())]
#[command(about = "Browse and manage warehouse inventory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Inventory service URL (overrides GODOWN_API_URL and godown.toml)
    #[arg(long, global = true, value_name = "URL", help_heading = "Options")]
    pub api_url: Option<String>,

    /// Verbose output (debug logging to stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session token
    #[command(display_order = 1)]
    Login {
        #[arg(long)]
        email: String,

        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account and log in
    #[command(display_order = 2)]
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session token
    #[command(display_order = 3)]
    Logout,

    /// Show the logged-in user
    #[command(display_order = 4)]
    Whoami,

    /// Show the location tree (default command)
    #[command(alias = "ls", display_order = 10)]
    Tree {
        /// Expand every location
        #[arg(long, short = 'a')]
        expand_all: bool,

        /// Expand these locations
        #[arg(long = "open", value_name = "ID")]
        open: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List items, optionally filtered
    #[command(display_order = 11)]
    Items {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Manage locations
    #[command(subcommand)]
    Location(LocationCommands),

    /// Manage items
    #[command(subcommand)]
    Item(ItemCommands),

    /// Interactive dashboard
    #[command(display_order = 20)]
    Shell,

    /// Print the resolved configuration
    #[command(display_order = 30)]
    Config,
}

#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Only items in this category
    #[arg(long, default_value = "")]
    pub category: String,

    /// Only items of this brand
    #[arg(long, default_value = "")]
    pub brand: String,

    /// Only items with this status (in_stock, out_of_stock)
    #[arg(long, default_value = "")]
    pub status: String,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ItemFilter {
        ItemFilter::new(
            self.category.trim(),
            self.brand.trim(),
            self.status.trim(),
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum LocationCommands {
    /// Create a godown or a sub-location
    #[command(group(ArgGroup::new("kind").required(true).args(["godown", "parent"])))]
    Add {
        name: String,

        /// Create a top-level godown
        #[arg(long)]
        godown: bool,

        /// Create a sub-location inside this godown
        #[arg(long, value_name = "ID")]
        parent: Option<String>,

        #[command(flatten)]
        item: BundledItemArgs,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Delete a location
    #[command(alias = "delete")]
    Rm {
        id: String,

        /// Also delete everything inside it
        #[arg(long)]
        cascade: bool,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show a location with its sub-locations and items
    Show { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Add an item to a sub-location
    Add {
        location_id: String,

        #[command(flatten)]
        fields: ItemArgs,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Delete an item
    #[command(alias = "delete")]
    Rm { id: String },

    /// Show an item's details
    Show { id: String },
}

#[derive(Args, Debug, Clone)]
pub struct ItemArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, allow_hyphen_values = true)]
    pub quantity: String,

    #[arg(long)]
    pub category: String,

    #[arg(long, allow_hyphen_values = true)]
    pub price: String,

    #[arg(long)]
    pub brand: String,

    /// in_stock (default) or out_of_stock
    #[arg(long)]
    pub status: Option<String>,

    /// Free-form JSON object, e.g. '{"voltage": 18}'
    #[arg(long)]
    pub attributes: Option<String>,

    #[arg(long)]
    pub image_url: Option<String>,
}

impl ItemArgs {
    pub fn to_draft(&self) -> ItemDraft {
        ItemDraft {
            name: self.name.clone(),
            quantity: self.quantity.clone(),
            category: self.category.clone(),
            status: self.status.clone().unwrap_or_default(),
            price: self.price.clone(),
            brand: self.brand.clone(),
            attributes: self.attributes.clone().unwrap_or_default(),
            image_url: self.image_url.clone().unwrap_or_default(),
        }
    }
}

/// Initial item created together with a new sub-location.
#[derive(Args, Debug, Default, Clone)]
pub struct BundledItemArgs {
    /// Also create a first item with this name
    #[arg(long, value_name = "NAME", help_heading = "Initial item")]
    pub item_name: Option<String>,

    #[arg(long, allow_hyphen_values = true, help_heading = "Initial item")]
    pub item_quantity: Option<String>,

    #[arg(long, help_heading = "Initial item")]
    pub item_category: Option<String>,

    #[arg(long, allow_hyphen_values = true, help_heading = "Initial item")]
    pub item_price: Option<String>,

    #[arg(long, help_heading = "Initial item")]
    pub item_brand: Option<String>,

    #[arg(long, help_heading = "Initial item")]
    pub item_status: Option<String>,

    #[arg(long, help_heading = "Initial item")]
    pub item_attributes: Option<String>,

    #[arg(long, help_heading = "Initial item")]
    pub item_image_url: Option<String>,
}

impl BundledItemArgs {
    /// `None` unless at least one `--item-*` flag was given.
    pub fn to_draft(&self) -> Option<ItemDraft> {
        let fields = [
            &self.item_name,
            &self.item_quantity,
            &self.item_category,
            &self.item_price,
            &self.item_brand,
            &self.item_status,
            &self.item_attributes,
            &self.item_image_url,
        ];
        if fields.iter().all(|f| f.is_none()) {
            return None;
        }
        let text = |f: &Option<String>| f.clone().unwrap_or_default();
        Some(ItemDraft {
            name: text(&self.item_name),
            quantity: text(&self.item_quantity),
            category: text(&self.item_category),
            status: text(&self.item_status),
            price: text(&self.item_price),
            brand: text(&self.item_brand),
            attributes: text(&self.item_attributes),
            image_url: text(&self.item_image_url),
        })
    }
}

pub fn location_draft(name: &str, godown: bool, parent: Option<&str>) -> LocationDraft {
    if godown {
        LocationDraft::godown(name)
    } else {
        LocationDraft {
            name: name.to_string(),
            is_godown: false,
            parent_id: parent.map(str::to_string),
        }
    }
}
