use std::{io::Write as _, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    catalog::CatalogController,
    form::LOAD_FAILED_MESSAGE,
    load_settings, CatalogEvent, DraftField, FormController, FormEvent, HttpProductGateway,
    ProductGateway, Settings, SubmitOutcome,
};
use shared::{
    domain::{Category, ProductId},
    error::GatewayError,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catalog", about = "Browse and edit the remote product catalog")]
struct Cli {
    /// Overrides the configured API root, e.g. https://api.escuelajs.co/api/v1
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: i64,
    },
    Create(DraftArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        draft: DraftArgs,
    },
    Delete {
        id: i64,
        /// Page the product is listed on.
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct DraftArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    price: Option<String>,
    /// Category id (1-5) or name.
    #[arg(long, value_parser = parse_category)]
    category: Option<Category>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, conflicts_with = "image_file")]
    image_url: Option<String>,
    /// Local image embedded as a data URL.
    #[arg(long)]
    image_file: Option<PathBuf>,
}

fn parse_category(raw: &str) -> Result<Category, String> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .and_then(Category::from_id)
        .or_else(|| {
            Category::ALL
                .into_iter()
                .find(|category| category.label().eq_ignore_ascii_case(raw))
        })
        .ok_or_else(|| format!("unknown category '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    let gateway: Arc<dyn ProductGateway> = Arc::new(
        HttpProductGateway::from_settings(&settings).context("failed to configure gateway")?,
    );

    match cli.command {
        Command::List { page, search } => list(gateway, &settings, page, search).await,
        Command::Show { id } => show(gateway, ProductId(id)).await,
        Command::Create(draft) => {
            let form = FormController::create(gateway).with_settings(&settings);
            save(form, draft).await
        }
        Command::Edit { id, draft } => {
            let form = FormController::load_for_edit(gateway, ProductId(id))
                .await
                .map_err(load_error)?
                .with_settings(&settings);
            save(form, draft).await
        }
        Command::Delete { id, page, yes } => {
            delete(gateway, &settings, ProductId(id), page, yes).await
        }
    }
}

fn load_error(err: GatewayError) -> anyhow::Error {
    match err {
        GatewayError::NotFound(_) => anyhow!(LOAD_FAILED_MESSAGE),
        other => anyhow!("{}: {other}", other.user_message()),
    }
}

async fn open_page(
    gateway: Arc<dyn ProductGateway>,
    settings: &Settings,
    page: usize,
) -> CatalogController {
    let mut catalog = CatalogController::new(gateway, settings.page_size);
    catalog.dispatch(CatalogEvent::Mount).await;
    while catalog.current_page() < page && catalog.has_next() && catalog.error().is_none() {
        catalog.dispatch(CatalogEvent::NextPage).await;
    }
    if catalog.current_page() < page {
        tracing::warn!(
            requested = page,
            reached = catalog.current_page(),
            "catalog ended before the requested page"
        );
    }
    catalog
}

async fn list(
    gateway: Arc<dyn ProductGateway>,
    settings: &Settings,
    page: usize,
    search: Option<String>,
) -> Result<()> {
    let mut catalog = open_page(gateway, settings, page).await;
    if let Some(term) = search {
        catalog.dispatch(CatalogEvent::Search(term)).await;
    }
    if let Some(err) = catalog.error() {
        bail!("{err}");
    }

    let visible = catalog.visible();
    if visible.is_empty() {
        println!("No products found.");
    }
    for product in visible {
        println!(
            "{:>6}  {:<40}  {:>10.2}  {}",
            product.id,
            product.title,
            product.price,
            product.category_name().unwrap_or("-")
        );
    }
    println!("{}", page_footer(&catalog));
    Ok(())
}

fn page_footer(catalog: &CatalogController) -> String {
    let current = catalog.current_page();
    let mut footer = format!("page {current}");
    if catalog.has_previous() {
        footer.push_str(&format!("  [previous: --page {}]", current - 1));
    }
    if catalog.has_next() {
        footer.push_str(&format!("  [next: --page {}]", current + 1));
    }
    footer
}

async fn show(gateway: Arc<dyn ProductGateway>, id: ProductId) -> Result<()> {
    let product = gateway.get_by_id(id).await.map_err(load_error)?;
    println!("id:          {}", product.id);
    println!("title:       {}", product.title);
    println!("price:       {:.2}", product.price);
    println!("category:    {}", product.category_name().unwrap_or("-"));
    println!("description: {}", product.description);
    println!("image:       {}", product.primary_image().unwrap_or("-"));
    Ok(())
}

async fn save(mut form: FormController, draft: DraftArgs) -> Result<()> {
    let mut events = Vec::new();
    let fields = [
        (DraftField::Title, draft.title),
        (DraftField::Price, draft.price),
        (DraftField::Description, draft.description),
        (DraftField::Image, draft.image_url),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            events.push(FormEvent::FieldChanged { field, value });
        }
    }
    if let Some(category) = draft.category {
        events.push(FormEvent::CategorySelected(category));
    }
    if let Some(path) = draft.image_file {
        events.push(FormEvent::ImageFileSelected(path));
    }
    for event in events {
        form.dispatch(event).await;
    }

    match form.dispatch(FormEvent::Submit).await {
        Some(SubmitOutcome::Saved(product)) => {
            println!("saved product {} ({})", product.id, product.title);
            Ok(())
        }
        Some(SubmitOutcome::Invalid) => {
            for (field, message) in form.errors() {
                eprintln!("{}: {message}", field.label());
            }
            bail!("product draft is invalid")
        }
        Some(SubmitOutcome::Failed(err)) => {
            let message = form.error(DraftField::Submit).unwrap_or("save failed");
            bail!("{message} ({err})")
        }
        Some(SubmitOutcome::Busy) | None => bail!("a save is already in progress"),
    }
}

async fn delete(
    gateway: Arc<dyn ProductGateway>,
    settings: &Settings,
    id: ProductId,
    page: usize,
    yes: bool,
) -> Result<()> {
    let mut catalog = open_page(gateway, settings, page).await;
    if let Some(err) = catalog.error() {
        bail!("{err}");
    }

    catalog.dispatch(CatalogEvent::RequestDelete(id)).await;
    let Some(title) = catalog
        .pending_delete()
        .target()
        .map(|product| product.title.clone())
    else {
        bail!("product {id} is not listed on page {page}");
    };

    if !(yes || confirm(&format!("Delete the product '{title}'?"))?) {
        catalog.dispatch(CatalogEvent::CancelDelete).await;
        println!("cancelled");
        return Ok(());
    }

    catalog.dispatch(CatalogEvent::ConfirmDelete).await;
    if let Some(banner) = catalog.banner() {
        bail!("{banner}");
    }
    println!("deleted product {id}; {} remaining on page", catalog.items().len());
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
