use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use crate::dns::{FileDnsBackend, REDIS_DNS_MANAGE_CODE, RedisDnsManageService};
use crate::flow::{FlowStep, Scene, SpoolController, StepInputs, StepLog, TicketPipeline};
use crate::flow_log;
use crate::report::{self, ReportKind};
use crate::settings::{FlowSettings, load_settings};
use crate::ticket::registry::TicketTypeInfo;
use crate::ticket::{BuilderRegistry, Ticket, TicketType};

mod config_cmd;

use config_cmd::{ConfigCommand, PathFlags};

#[derive(Parser)]
#[command(name = "dbm-ticket-flow")]
#[command(about = "Build, launch and reconcile Redis cluster change tickets", version)]
pub struct Cli {
    #[arg(long, global = true, help = "Enable debug logging.")]
    debug: bool,
    #[arg(long, global = true, help = "State directory for spooled flows and the DNS store.")]
    state_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "DNS record store file.")]
    dns_store: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Tickets(TicketsArgs),
    Build(BuildArgs),
    Submit(SubmitArgs),
    Flow(FlowCommand),
    VmDisable(VmDisableArgs),
    Dns(DnsArgs),
    Report(ReportArgs),
    Config(ConfigCommand),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
    Yaml,
}

#[derive(Parser)]
#[command(
    about = "List registered ticket types.",
    long_about = "Prints ticket type, phase, permission action, controller scene and display name."
)]
struct TicketsArgs {
    #[arg(long, help = "Only list this ticket type, e.g. REDIS_PROXY_CLOSE or redis-proxy-close.")]
    ticket_type: Option<String>,
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Parser)]
#[command(
    about = "Validate a ticket and print its flow parameters.",
    long_about = "Resolves the ticket's builder and prints the parameters without launching anything."
)]
struct BuildArgs {
    #[arg(long, help = "Ticket document (JSON or YAML).")]
    ticket: PathBuf,
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Parser)]
#[command(
    about = "Validate, build and launch a ticket.",
    long_about = "Spools the built flow for the workflow engine and prints the root id."
)]
struct SubmitArgs {
    #[arg(long, help = "Ticket document (JSON or YAML).")]
    ticket: PathBuf,
}

#[derive(Parser)]
struct FlowCommand {
    #[command(subcommand)]
    command: FlowSubcommand,
}

#[derive(Subcommand)]
enum FlowSubcommand {
    #[command(about = "Print a spooled flow launch by root id")]
    Show(FlowShowArgs),
}

#[derive(Parser)]
struct FlowShowArgs {
    root_id: String,
}

#[derive(Parser)]
#[command(
    about = "Launch the VM disable scene directly.",
    long_about = "Passes the request document to the scene as-is, without ticket validation."
)]
struct VmDisableArgs {
    #[arg(long, help = "Request document (JSON or YAML).")]
    ticket: PathBuf,
}

#[derive(Parser)]
#[command(
    about = "Run the redis_dns_manage step against the DNS store.",
    long_about = "Executes one DNS reconciliation step; exits non-zero when the step fails."
)]
struct DnsArgs {
    #[arg(long)]
    kwargs: PathBuf,
    #[arg(long)]
    global_data: PathBuf,
    #[arg(long)]
    trans_data: Option<PathBuf>,
}

#[derive(Parser)]
#[command(
    about = "Print a metadata check report.",
    long_about = "Selects the report's rows from a row dump and prints them with the report title."
)]
struct ReportArgs {
    #[arg(long, default_value = "meta-check")]
    kind: String,
    #[arg(long)]
    rows: PathBuf,
}

struct AppCtx {
    settings: FlowSettings,
    state_dir: PathBuf,
    dns_store: PathBuf,
}

impl AppCtx {
    fn pipeline(&self) -> anyhow::Result<TicketPipeline<SpoolController>> {
        let registry = BuilderRegistry::standard()?;
        Ok(TicketPipeline::new(
            registry,
            SpoolController::new(&self.state_dir),
        ))
    }
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let settings = load_settings()?;
        let flags = PathFlags {
            state_dir: self.state_dir.clone(),
            dns_store: self.dns_store.clone(),
        };
        flow_log::init(settings.log_filter.as_deref(), self.debug);
        let state_dir = settings.resolve_state_dir(self.state_dir.as_deref())?;
        let dns_store = settings.resolve_dns_store(self.dns_store.as_deref(), &state_dir);
        let ctx = AppCtx {
            settings,
            state_dir,
            dns_store,
        };
        match self.command {
            Command::Tickets(args) => args.run(&ctx),
            Command::Build(args) => args.run(&ctx),
            Command::Submit(args) => args.run(&ctx),
            Command::Flow(args) => args.run(&ctx),
            Command::VmDisable(args) => args.run(&ctx),
            Command::Dns(args) => args.run(&ctx),
            Command::Report(args) => args.run(),
            Command::Config(args) => args.run(ctx.settings, flags).map(|_| ()),
        }
    }
}

impl TicketsArgs {
    fn run(self, ctx: &AppCtx) -> anyhow::Result<()> {
        let only = self
            .ticket_type
            .as_deref()
            .map(|raw| {
                TicketType::parse(raw).ok_or_else(|| anyhow!("unknown ticket type {raw}"))
            })
            .transpose()?;
        let pipeline = ctx.pipeline()?;
        let infos = pipeline
            .registry()
            .entries()
            .filter(|entry| only.is_none_or(|ticket_type| entry.ticket_type == ticket_type))
            .map(|entry| entry.info())
            .collect::<Vec<_>>();
        if let Format::Text = self.format {
            for info in &infos {
                println!("{}", ticket_row(info));
            }
            return Ok(());
        }
        print_formatted(&infos, self.format)
    }
}

/// Columns follow the `tickets` help text.
fn ticket_row(info: &TicketTypeInfo) -> String {
    format!(
        "{:<22} {:<8} {:<18} {:<32} {}",
        info.ticket_type.as_str(),
        info.phase.as_str(),
        info.iam_action,
        info.scene,
        info.name
    )
}

impl BuildArgs {
    fn run(self, ctx: &AppCtx) -> anyhow::Result<()> {
        let ticket = load_ticket(&self.ticket)?;
        let pipeline = ctx.pipeline()?;
        let (entry, params) = pipeline.build(&ticket)?;
        let output = json!({
            "scene": entry.builder.scene,
            "phase": entry.phase,
            "params": params,
        });
        print_formatted(&output, self.format)
    }
}

impl SubmitArgs {
    fn run(self, ctx: &AppCtx) -> anyhow::Result<()> {
        let ticket = load_ticket(&self.ticket)?;
        let submission = ctx.pipeline()?.submit(&ticket)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "root_id": submission.root_id,
                "scene": submission.scene,
            }))?
        );
        Ok(())
    }
}

impl FlowCommand {
    fn run(self, ctx: &AppCtx) -> anyhow::Result<()> {
        match self.command {
            FlowSubcommand::Show(args) => args.run(ctx),
        }
    }
}

impl FlowShowArgs {
    fn run(self, ctx: &AppCtx) -> anyhow::Result<()> {
        let controller = SpoolController::new(&ctx.state_dir);
        let record = controller
            .load(&self.root_id)?
            .ok_or_else(|| anyhow!("no flow launched with root id {}", self.root_id))?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        Ok(())
    }
}

impl VmDisableArgs {
    fn run(self, ctx: &AppCtx) -> anyhow::Result<()> {
        tracing::info!("start vm disable scene");
        let data = read_document(&self.ticket)?;
        let root_id = ctx.pipeline()?.launch_scene(Scene::VmDisable, &data)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "root_id": root_id }))?
        );
        Ok(())
    }
}

impl DnsArgs {
    fn run(self, ctx: &AppCtx) -> anyhow::Result<()> {
        let inputs = StepInputs {
            kwargs: read_document(&self.kwargs)?,
            global_data: read_document(&self.global_data)?,
            trans_data: match &self.trans_data {
                Some(path) => read_document(path)?,
                None => json!({}),
            },
        };
        let service = RedisDnsManageService::new(FileDnsBackend::new(&ctx.dns_store));
        let mut log = StepLog::new(REDIS_DNS_MANAGE_CODE);
        let result = service.run(&inputs, &mut log);
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "result": result,
                "log": log.entries(),
            }))?
        );
        if !result {
            return Err(anyhow!("{REDIS_DNS_MANAGE_CODE} step failed"));
        }
        Ok(())
    }
}

impl ReportArgs {
    fn run(self) -> anyhow::Result<()> {
        let kind = ReportKind::parse(&self.kind)
            .ok_or_else(|| anyhow!("unknown report kind {}", self.kind))?;
        let rows = report::load_rows(&self.rows)?;
        println!("{}", serde_json::to_string_pretty(&kind.page(&rows))?);
        Ok(())
    }
}

fn load_ticket(path: &Path) -> anyhow::Result<Ticket> {
    let value = read_document(path)?;
    serde_json::from_value(value).with_context(|| format!("parse ticket {}", path.display()))
}

/// Read a JSON document, or YAML when the extension says so.
pub fn read_document(path: &Path) -> anyhow::Result<JsonValue> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        return serde_yaml_bw::from_str(&contents)
            .with_context(|| format!("parse yaml {}", path.display()));
    }
    serde_json::from_str(&contents).with_context(|| format!("parse json {}", path.display()))
}

fn print_formatted<T: Serialize>(value: &T, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Yaml => print!("{}", serde_yaml_bw::to_string(value)?),
        Format::Json | Format::Text => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
