use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storefront::application::auth::AuthContext;
use storefront::application::cart::CartService;
use storefront::application::chat::{ChatRelay, persistent_session};
use storefront::application::checkout::CheckoutFlow;
use storefront::application::reconcile::OrderReconciler;
use storefront::config::Config;
use storefront::domain::order::Order;
use storefront::domain::ports::{OrderStore, SupportCompletionBox};
use storefront::error::StorefrontError;
use storefront::infrastructure::completion::{CannedCompletion, HttpCompletion};
use storefront::infrastructure::gateway::{RedirectCheckoutGateway, StaticGateway};
use storefront::infrastructure::in_memory::{
    InMemoryAuthBackend, InMemoryCartStore, InMemoryChatLog, InMemoryOrderStore,
    InMemoryProductStore,
};
use storefront::infrastructure::rest::RestBackend;
use storefront::infrastructure::session_file::FileSessionVault;
use storefront::interfaces::csv::catalog_reader::CatalogReader;
use storefront::interfaces::csv::order_writer::OrderWriter;
use storefront::interfaces::redirect::parse_return_url;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed an in-memory catalog from a CSV file and run fully offline.
    /// Without this, the hosted backend from the environment is used.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Email for flows that need a signed-in user (hosted backend)
    #[arg(long)]
    email: Option<String>,

    /// Password for flows that need a signed-in user (hosted backend)
    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog
    Products,
    /// Send one message to the support chat and print the reply
    Chat { message: String },
    /// Build an order from the cart and run the card checkout
    Checkout {
        /// Product to add before checking out, as "product_id" or
        /// "product_id:qty"; repeatable
        #[arg(long = "item")]
        items: Vec<String>,
        /// Scripted gateway outcome in catalog mode: approve or cancel
        #[arg(long, default_value = "approve")]
        outcome: String,
    },
    /// Apply a payment return URL to the order it names
    Reconcile { url: String },
    /// List the signed-in user's orders, optionally exporting them as CSV
    Orders {
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.catalog.clone() {
        Some(path) => run_catalog_mode(cli, config, &path).await,
        None => run_hosted_mode(cli, config).await,
    }
}

/// Offline mode: in-memory stores seeded from a catalog CSV, a scripted
/// gateway, and the provider redirect played back in-process.
async fn run_catalog_mode(cli: Cli, config: Config, catalog: &Path) -> Result<()> {
    let products = seed_catalog(catalog)?;

    match cli.command {
        Command::Products => {
            print_products(&products).await?;
        }
        Command::Chat { message } => {
            let relay = build_relay(
                Box::new(products),
                Box::new(InMemoryChatLog::new()),
                &config,
            )?;
            let reply = relay.send(&message).await.into_diagnostic()?;
            println!("{reply}");
        }
        Command::Checkout { items, outcome } => {
            let auth = AuthContext::new(Box::new(InMemoryAuthBackend::new()));
            auth.init().await.into_diagnostic()?;
            let session = auth
                .sign_up("demo@localhost", "demo-password")
                .await
                .into_diagnostic()?
                .ok_or_else(|| miette::miette!("로컬 세션을 만들지 못했습니다."))?;

            let cart = Arc::new(CartService::new(Box::new(InMemoryCartStore::new(
                products.clone(),
            ))));
            for item in &items {
                let (product_id, quantity) = parse_item(item)?;
                cart.add(&product_id, quantity).await.into_diagnostic()?;
            }

            let orders = InMemoryOrderStore::new();
            let gateway = if outcome == "cancel" {
                StaticGateway::cancelling("결제가 취소되었습니다.")
            } else {
                StaticGateway::redirecting()
            };
            let flow = CheckoutFlow::new(
                cart,
                Box::new(orders.clone()),
                Box::new(gateway),
                config.success_url(),
                config.fail_url(),
            );

            match flow.buy_now(Some(&session)).await {
                Ok(order) => {
                    // The provider approves and redirects back with a
                    // transaction key; play that return through the
                    // reconciler as the result page would.
                    let return_url = format!(
                        "{}?orderId={}&paymentKey=sim_{}",
                        config.success_url(),
                        order.id,
                        order.id
                    );
                    let redirect = parse_return_url(&return_url).into_diagnostic()?;
                    let reconciler = OrderReconciler::new(Box::new(orders.clone()));
                    let settled = reconciler.reconcile(&redirect).await.into_diagnostic()?;
                    println!(
                        "결제가 완료되었습니다: 주문 {} [{}] {} ({})",
                        settled.id, settled.title, settled.total, settled.status
                    );
                }
                Err(StorefrontError::Gateway(message)) => {
                    let stored = orders.for_user(&session.user.id).await.into_diagnostic()?;
                    let status = stored
                        .first()
                        .map(|order| order.status.label())
                        .unwrap_or("결제실패");
                    println!("결제를 진행하지 못했습니다: {message} (주문 상태: {status})");
                }
                Err(other) => {
                    auth.teardown();
                    return Err(other).into_diagnostic();
                }
            }
            auth.teardown();
        }
        Command::Reconcile { url } => {
            let redirect = parse_return_url(&url).into_diagnostic()?;
            let reconciler = OrderReconciler::new(Box::new(InMemoryOrderStore::new()));
            let order = reconciler.reconcile(&redirect).await.into_diagnostic()?;
            println!("주문 {} 상태가 {}(으)로 반영되었습니다.", order.id, order.status);
        }
        Command::Orders { export } => {
            let orders = InMemoryOrderStore::new().for_user("demo").await.into_diagnostic()?;
            output_orders(&orders, export.as_deref())?;
        }
    }
    Ok(())
}

/// Hosted mode: every store and the auth backend go through the configured
/// platform; the gateway and completion endpoints are the real ones.
async fn run_hosted_mode(cli: Cli, config: Config) -> Result<()> {
    let (Some(base_url), Some(anon_key)) = (config.backend_url.clone(), config.anon_key.clone())
    else {
        return Err(miette::miette!(
            "STOREFRONT_BACKEND_URL과 STOREFRONT_ANON_KEY가 필요합니다. 오프라인 실행은 --catalog 옵션을 사용하세요."
        ));
    };

    let backend = RestBackend::new(base_url, anon_key);
    let auth = AuthContext::new(Box::new(backend.clone()));
    auth.init().await.into_diagnostic()?;
    if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
        auth.sign_in(email, password).await.into_diagnostic()?;
    }

    let result = match cli.command {
        Command::Products => print_products(&backend).await,
        Command::Chat { message } => {
            let relay = build_relay(Box::new(backend.clone()), Box::new(backend.clone()), &config)?;
            let reply = relay.send(&message).await.into_diagnostic()?;
            println!("{reply}");
            Ok(())
        }
        Command::Checkout { items, .. } => {
            let session = auth.session().await.ok_or_else(|| {
                miette::miette!("로그인이 필요합니다. --email과 --password를 지정해 주세요.")
            })?;

            let cart = Arc::new(CartService::new(Box::new(backend.clone())));
            for item in &items {
                let (product_id, quantity) = parse_item(item)?;
                cart.add(&product_id, quantity).await.into_diagnostic()?;
            }

            let gateway =
                RedirectCheckoutGateway::new(&config.payment_client_key, &config.gateway_api);
            let flow = CheckoutFlow::new(
                cart,
                Box::new(backend.clone()),
                Box::new(gateway),
                config.success_url(),
                config.fail_url(),
            );

            let order = flow.buy_now(Some(&session)).await.into_diagnostic()?;
            println!(
                "결제창 호출에 성공했습니다: 주문 {} [{}] {} ({})",
                order.id, order.title, order.total, order.status
            );
            Ok(())
        }
        Command::Reconcile { url } => {
            let redirect = parse_return_url(&url).into_diagnostic()?;
            let reconciler = OrderReconciler::new(Box::new(backend.clone()));
            let order = reconciler.reconcile(&redirect).await.into_diagnostic()?;
            println!("주문 {} 상태가 {}(으)로 반영되었습니다.", order.id, order.status);
            Ok(())
        }
        Command::Orders { export } => {
            let session = auth.session().await.ok_or_else(|| {
                miette::miette!("로그인이 필요합니다. --email과 --password를 지정해 주세요.")
            })?;
            let orders = backend
                .for_user(&session.user.id)
                .await
                .into_diagnostic()?;
            output_orders(&orders, export.as_deref())
        }
    };

    auth.teardown();
    result
}

fn build_relay(
    products: storefront::domain::ports::ProductStoreBox,
    log: storefront::domain::ports::ChatMessageStoreBox,
    config: &Config,
) -> Result<ChatRelay> {
    let completion: SupportCompletionBox = match &config.chat_endpoint {
        Some(endpoint) => Box::new(HttpCompletion::new(endpoint, config.anon_key.clone())),
        None => Box::new(CannedCompletion::unavailable()),
    };
    let vault = FileSessionVault::new(config.session_file.clone());
    let session_id = persistent_session(&vault).into_diagnostic()?;
    Ok(ChatRelay::new(products, log, completion, session_id))
}

fn seed_catalog(path: &Path) -> Result<InMemoryProductStore> {
    let file = File::open(path).into_diagnostic()?;
    let mut products = Vec::new();
    for row in CatalogReader::new(file).products() {
        match row {
            Ok(product) => products.push(product),
            Err(error) => eprintln!("Error reading catalog row: {error}"),
        }
    }
    Ok(InMemoryProductStore::seeded(products))
}

async fn print_products(store: &dyn storefront::domain::ports::ProductStore) -> Result<()> {
    let products = store.all().await.into_diagnostic()?;
    if products.is_empty() {
        println!("등록된 상품이 없습니다.");
        return Ok(());
    }
    for product in products {
        println!(
            "{}\t{}\t{}\t{}",
            product.id, product.name, product.price, product.category
        );
    }
    Ok(())
}

fn parse_item(item: &str) -> Result<(String, u32)> {
    match item.split_once(':') {
        Some((product_id, quantity)) => {
            let quantity: u32 = quantity
                .trim()
                .parse()
                .map_err(|_| miette::miette!("잘못된 수량입니다: {item}"))?;
            Ok((product_id.trim().to_string(), quantity))
        }
        None => Ok((item.trim().to_string(), 1)),
    }
}

fn output_orders(orders: &[Order], export: Option<&Path>) -> Result<()> {
    if let Some(path) = export {
        let file = File::create(path).into_diagnostic()?;
        OrderWriter::new(file).write_orders(orders).into_diagnostic()?;
        println!("{}건의 주문을 내보냈습니다.", orders.len());
        return Ok(());
    }

    if orders.is_empty() {
        println!("주문 내역이 없습니다.");
        return Ok(());
    }
    for order in orders {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            order.id,
            order.title,
            order.total,
            order.status,
            order.payment_key.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
