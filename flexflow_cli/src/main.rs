use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use flexflow_core::library::{self, ActionDraft};
use flexflow_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "flexflow")]
#[command(about = "Workout planning and live training tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a different config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List plans with estimated duration
    Plans,

    /// Show the steps of a plan
    Show { plan_id: String },

    /// Create a plan from library actions
    CreatePlan {
        #[arg(long)]
        name: String,

        /// Action id to add as a step (repeatable)
        #[arg(long = "action", required = true)]
        actions: Vec<String>,
    },

    /// Edit an existing plan
    EditPlan {
        plan_id: String,

        #[arg(long)]
        name: Option<String>,

        /// Append a step for this action id (repeatable)
        #[arg(long)]
        add: Vec<String>,

        /// Remove the step for this action id (repeatable)
        #[arg(long)]
        remove: Vec<String>,

        /// Reorder steps, 1-based FROM:TO (repeatable)
        #[arg(long = "move")]
        moves: Vec<String>,

        /// Limit field changes to the step for this action id
        #[arg(long)]
        step: Option<String>,

        #[arg(long)]
        sets: Option<String>,

        #[arg(long)]
        reps: Option<String>,

        #[arg(long)]
        weight: Option<String>,

        /// Rest after each set, in seconds
        #[arg(long)]
        rest: Option<String>,
    },

    /// Delete a plan
    DeletePlan {
        plan_id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Print a share link for a plan
    Share { plan_id: String },

    /// Import a plan from a share link
    Import { link: String },

    /// Run a live training session
    Train {
        plan_id: String,

        /// Complete sets and proceed without prompting (for testing)
        #[arg(long)]
        auto: bool,

        /// Override the countdown tick length in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,
    },

    /// Calendar of completed sessions
    Records {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,

        /// Day to list (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Append all records to a CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Manage the action library
    Actions {
        #[command(subcommand)]
        command: ActionsCommand,
    },

    /// Show or update the profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

#[derive(Subcommand)]
enum ActionsCommand {
    List,
    Add {
        #[arg(long)]
        name: String,

        /// Target body part
        #[arg(long, default_value = "")]
        part: String,

        #[arg(long)]
        image: Option<String>,
    },
    Delete { action_id: String },
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    Set {
        #[arg(long)]
        height: Option<f64>,

        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        body_fat: Option<f64>,

        #[arg(long)]
        theme: Option<String>,
    },
}

/// Terminal bell cue; write failures are ignored
struct TerminalBell {
    enabled: bool,
}

impl CueSink for TerminalBell {
    fn play(&mut self, cue: Cue) {
        if !self.enabled {
            return;
        }
        tracing::trace!("Cue {:?}", cue);
        let mut stderr = io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    flexflow_core::logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let store = Store::new(data_dir);

    match run(cli.command, &store, &config) {
        Err(e) if e.is_user_facing() => {
            eprintln!("{}", e);
            Ok(())
        }
        other => other,
    }
}

fn run(command: Commands, store: &Store, config: &Config) -> Result<()> {
    match command {
        Commands::Plans => cmd_plans(store),
        Commands::Show { plan_id } => cmd_show(store, &plan_id),
        Commands::CreatePlan { name, actions } => cmd_create_plan(store, name, actions),
        Commands::EditPlan {
            plan_id,
            name,
            add,
            remove,
            moves,
            step,
            sets,
            reps,
            weight,
            rest,
        } => {
            let patch = StepPatch {
                weight,
                reps,
                sets: sets.map(|s| parse_field(&s)),
                rest_seconds: rest.map(|s| parse_field(&s)),
            };
            cmd_edit_plan(store, &plan_id, name, add, remove, moves, step, patch)
        }
        Commands::DeletePlan { plan_id, yes } => cmd_delete_plan(store, &plan_id, yes),
        Commands::Share { plan_id } => cmd_share(store, &plan_id, config),
        Commands::Import { link } => cmd_import(store, &link),
        Commands::Train {
            plan_id,
            auto,
            tick_ms,
        } => {
            let tick = Duration::from_millis(tick_ms.unwrap_or(config.training.tick_millis));
            cmd_train(store, &plan_id, auto, tick, config.training.sound)
        }
        Commands::Records {
            month,
            date,
            export,
        } => cmd_records(store, month, date, export),
        Commands::Actions { command } => cmd_actions(store, command),
        Commands::Profile { command } => cmd_profile(store, command),
    }
}

fn cmd_plans(store: &Store) -> Result<()> {
    let plans = store.load_plans_or_seed()?;
    if plans.is_empty() {
        println!("No plans yet.");
        return Ok(());
    }
    for plan in &plans {
        println!(
            "{:<38} {}  ({} actions, ~{} min)",
            plan.id,
            plan.name,
            plan.actions.len(),
            estimate_minutes(plan)
        );
    }
    Ok(())
}

fn cmd_show(store: &Store, plan_id: &str) -> Result<()> {
    let actions = store.load_actions_or_seed()?;
    let plans = store.load_plans_or_seed()?;
    let plan = library::find_plan(&plans, plan_id)?;
    let lookup = library::actions_by_id(&actions);

    println!("\n  {}", plan.name);
    println!(
        "  ~{} min · {} actions · {} sets",
        estimate_minutes(plan),
        plan.actions.len(),
        plan.total_sets()
    );
    println!();
    for (i, step) in plan.actions.iter().enumerate() {
        let name = lookup
            .get(step.action_id.as_str())
            .map_or(session::UNKNOWN_ACTION, |a| a.name.as_str());
        println!(
            "  {}. {} — {} x {} @ {}, rest {}s",
            i + 1,
            name,
            step.sets,
            step.reps,
            step.weight,
            step.rest_seconds
        );
    }
    println!();
    Ok(())
}

fn cmd_create_plan(store: &Store, name: String, action_ids: Vec<String>) -> Result<()> {
    let actions = store.load_actions_or_seed()?;
    let mut plans = store.load_plans_or_seed()?;
    ensure_actions_exist(&actions, &action_ids)?;

    let mut editor = PlanEditor::new();
    editor.set_name(name);
    editor.add_steps(action_ids);
    let plan = editor.save(&mut plans)?;
    store.save_plans(&plans)?;

    println!("✓ Created plan {} ({})", plan.name, plan.id);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_edit_plan(
    store: &Store,
    plan_id: &str,
    name: Option<String>,
    add: Vec<String>,
    remove: Vec<String>,
    moves: Vec<String>,
    step: Option<String>,
    patch: StepPatch,
) -> Result<()> {
    let actions = store.load_actions_or_seed()?;
    let mut plans = store.load_plans_or_seed()?;
    let mut editor = PlanEditor::edit(library::find_plan(&plans, plan_id)?);

    if let Some(name) = name {
        editor.set_name(name);
    }

    ensure_actions_exist(&actions, &add)?;
    editor.add_steps(add);

    for action_id in &remove {
        match editor.key_for_action(action_id) {
            Some(key) => {
                editor.remove_step(key);
            }
            None => eprintln!("No step for action {} in this plan", action_id),
        }
    }

    for spec in &moves {
        let (from, to) = parse_move(spec)?;
        editor.move_step(from, to);
    }

    let targets = match &step {
        Some(action_id) => vec![editor
            .key_for_action(action_id)
            .ok_or_else(|| Error::Validation(format!("no step for action {}", action_id)))?],
        None => editor.steps().iter().map(|s| s.key).collect(),
    };
    for key in targets {
        editor.update_step(key, patch.clone());
    }

    let plan = editor.save(&mut plans)?;
    store.save_plans(&plans)?;
    println!("✓ Saved plan {} ({} actions)", plan.name, plan.actions.len());
    Ok(())
}

fn cmd_delete_plan(store: &Store, plan_id: &str, yes: bool) -> Result<()> {
    let mut plans = store.load_plans_or_seed()?;
    let name = library::find_plan(&plans, plan_id)?.name.clone();

    if !yes {
        print!("Delete plan \"{}\"? [y/N] ", name);
        io::stdout().flush()?;
        let answer = read_input()?.unwrap_or_default();
        if answer != "y" && answer != "yes" {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library::delete_plan(&mut plans, plan_id)?;
    store.save_plans(&plans)?;
    println!("✓ Deleted plan {}", name);
    Ok(())
}

fn cmd_share(store: &Store, plan_id: &str, config: &Config) -> Result<()> {
    let plans = store.load_plans_or_seed()?;
    let plan = library::find_plan(&plans, plan_id)?;
    println!("{}", share_link(&config.share.origin, plan)?);
    Ok(())
}

fn cmd_import(store: &Store, link: &str) -> Result<()> {
    let plan = import_from_link(link)?;
    let mut plans = store.load_plans_or_seed()?;
    let plan = library::import_plan(&mut plans, plan)?;
    store.save_plans(&plans)?;

    println!("✓ Imported plan {} as {}", plan.name, plan.id);
    Ok(())
}

fn cmd_train(store: &Store, plan_id: &str, auto: bool, tick: Duration, sound: bool) -> Result<()> {
    let actions = store.load_actions_or_seed()?;
    let plans = store.load_plans_or_seed()?;
    let plan = library::find_plan(&plans, plan_id)?.clone();

    let mut session =
        TrainingSession::start(plan, actions, store.clone(), TerminalBell { enabled: sound });

    loop {
        let snap = session.snapshot();
        match snap.phase {
            Phase::Working => {
                display_working(&snap);
                if !auto {
                    match prompt("Enter when the set is done, 'q' to quit")? {
                        Some(input) if input == "q" => return abandon(&mut session),
                        None => return abandon(&mut session),
                        Some(_) => {}
                    }
                }
                session.complete_set()?;
            }
            Phase::Resting => {
                while let Some(token) = session.pending_tick() {
                    print!("\r  Rest {}  ", format_rest(session.rest_remaining()));
                    io::stdout().flush()?;
                    if !tick.is_zero() {
                        std::thread::sleep(tick);
                    }
                    session.tick(token);
                }
                println!("\r  Rest 00:00  ");
            }
            Phase::AwaitingConfirmation => {
                display_confirm(&snap);
                if auto {
                    session.confirm_proceed()?;
                    continue;
                }
                match prompt("Enter to start, 'r' to rest a bit more, 'q' to quit")? {
                    Some(input) if input == "r" => {
                        session.extend_rest()?;
                    }
                    Some(input) if input == "q" => return abandon(&mut session),
                    None => return abandon(&mut session),
                    Some(_) => {
                        session.confirm_proceed()?;
                    }
                }
            }
            Phase::Finished => {
                println!("\n✓ Workout complete! Record saved for {}.", snap.plan_name);
                break;
            }
        }
    }

    Ok(())
}

fn abandon<R: RecordSink, C: CueSink>(session: &mut TrainingSession<R, C>) -> Result<()> {
    session.stop();
    println!("\nSession ended early, nothing recorded.");
    Ok(())
}

fn display_working(snap: &SessionSnapshot) {
    let Some(step) = &snap.current_step else {
        return;
    };
    let action = snap.current_action.as_ref();

    println!("\n╭─────────────────────────────────────────╮");
    println!(
        "│  {}",
        action.map_or(session::UNKNOWN_ACTION, |a| a.name())
    );
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  Set {} / {} · {} · {}",
        snap.position.set_number, step.sets, step.reps, step.weight
    );
    println!(
        "  Target: {}",
        action.and_then(|a| a.target_part()).unwrap_or("—")
    );
    if let Some(url) = action.and_then(|a| a.image_url()) {
        println!("  Image: {}", url);
    }
    println!("  Next: {}", describe_next(&snap.next));
}

fn display_confirm(snap: &SessionSnapshot) {
    let upcoming = if snap.is_last_set {
        match &snap.next {
            NextUp::Step { action, .. } => format!("next action: {}", action.name()),
            NextUp::PlanComplete => "next action".to_string(),
        }
    } else {
        format!(
            "next set: {}",
            snap.current_action
                .as_ref()
                .map_or(session::UNKNOWN_ACTION, |a| a.name())
        )
    };
    println!("  Get ready! {}", upcoming);
}

fn describe_next(next: &NextUp) -> String {
    match next {
        NextUp::Step { step, action } => format!("{} ({})", action.name(), step.weight),
        NextUp::PlanComplete => "finish workout".to_string(),
    }
}

fn cmd_records(
    store: &Store,
    month: Option<String>,
    date: Option<String>,
    export: Option<PathBuf>,
) -> Result<()> {
    let records = store.load_records()?;
    let plans = store.load_plans()?;
    let today = Local::now().date_naive();

    let selected = match date {
        Some(d) => parse_date(&d)?,
        None => today,
    };
    let shown_month = match month {
        Some(m) => parse_date(&format!("{}-01", m.trim()))?,
        None => selected,
    };

    let cells = history::month_grid(shown_month.year(), shown_month.month(), &records)?;
    println!("\n  {}", shown_month.format("%Y-%m"));
    println!("  Su  Mo  Tu  We  Th  Fr  Sa");
    for week in cells.chunks(7) {
        let line: Vec<String> = week
            .iter()
            .map(|cell| {
                let mark = if cell.has_record { '*' } else { ' ' };
                if cell.in_month {
                    format!("{:>2}{}", cell.date.day(), mark)
                } else {
                    format!(" .{}", mark)
                }
            })
            .collect();
        println!("  {}", line.join(" "));
    }

    let names = history::day_summary(selected, &records, &plans);
    println!();
    if names.is_empty() {
        println!("  {}: no workouts", selected.format("%Y-%m-%d"));
    } else {
        println!("  {} · {}", selected.format("%Y-%m-%d"), names.join(" / "));
    }

    if let Some(path) = export {
        let count = history::export_csv(&records, &path)?;
        println!("\n✓ Exported {} records to {}", count, path.display());
    }
    Ok(())
}

fn cmd_actions(store: &Store, command: ActionsCommand) -> Result<()> {
    let mut actions = store.load_actions_or_seed()?;
    match command {
        ActionsCommand::List => {
            for action in &actions {
                println!("{:<38} {}  [{}]", action.id, action.name, action.target_part);
            }
        }
        ActionsCommand::Add { name, part, image } => {
            let action = library::new_action(&ActionDraft {
                name,
                target_part: part,
                image_url: image,
            })?;
            println!("✓ Added action {} ({})", action.name, action.id);
            actions.push(action);
            store.save_actions(&actions)?;
        }
        ActionsCommand::Delete { action_id } => {
            let removed = library::delete_action(&mut actions, &action_id)
                .ok_or_else(|| Error::Validation(format!("no action with id {}", action_id)))?;
            store.save_actions(&actions)?;
            println!("✓ Deleted action {}", removed.name);

            let plans = store.load_plans()?;
            let referencing = plans
                .iter()
                .filter(|p| p.actions.iter().any(|s| s.action_id == action_id))
                .count();
            if referencing > 0 {
                println!(
                    "  {} plan(s) still list it and will show \"{}\"",
                    referencing,
                    session::UNKNOWN_ACTION
                );
            }
        }
    }
    Ok(())
}

fn cmd_profile(store: &Store, command: ProfileCommand) -> Result<()> {
    let mut profile = store.load_profile()?;
    if let ProfileCommand::Set {
        height,
        weight,
        body_fat,
        theme,
    } = command
    {
        profile.height = height.or(profile.height);
        profile.weight = weight.or(profile.weight);
        profile.body_fat = body_fat.or(profile.body_fat);
        if let Some(theme) = theme {
            profile.theme = ThemeStyle::from(theme);
        }
        store.save_profile(&profile)?;
        println!("✓ Profile saved");
    }

    let show = |v: Option<f64>| v.map_or_else(|| "—".to_string(), |v| v.to_string());
    println!("  Height:   {}", show(profile.height));
    println!("  Weight:   {}", show(profile.weight));
    println!("  Body fat: {}", show(profile.body_fat));
    println!("  Theme:    {}", profile.theme);
    Ok(())
}

fn ensure_actions_exist(actions: &[Action], ids: &[String]) -> Result<()> {
    let lookup = library::actions_by_id(actions);
    match ids.iter().find(|id| !lookup.contains_key(id.as_str())) {
        Some(missing) => Err(Error::Validation(format!("unknown action id {}", missing))),
        None => Ok(()),
    }
}

/// Parse a 1-based `FROM:TO` into 0-based indices
fn parse_move(spec: &str) -> Result<(usize, usize)> {
    let invalid = || Error::Validation(format!("invalid move {:?}, expected FROM:TO", spec));
    let (from, to) = spec.split_once(':').ok_or_else(invalid)?;
    let from: usize = from.trim().parse().map_err(|_| invalid())?;
    let to: usize = to.trim().parse().map_err(|_| invalid())?;
    match (from.checked_sub(1), to.checked_sub(1)) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(invalid()),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("invalid date {:?}", raw)))
}

fn prompt(message: &str) -> Result<Option<String>> {
    println!("─────────────────────────────────────────");
    println!("{}", message);
    print!("> ");
    io::stdout().flush()?;
    read_input()
}

/// One trimmed, lowercased line; `None` at end of input
fn read_input() -> Result<Option<String>> {
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_lowercase()))
}
