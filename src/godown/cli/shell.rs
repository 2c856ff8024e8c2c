//! # Interactive Shell
//!
//! `godown shell` keeps one session open and redraws the dashboard after every
//! command. Lines are read on a separate thread and handed over through a channel,
//! so the main loop can wait for input *or* for a pending filter edit to settle,
//! whichever comes first. Filter edits typed in quick succession end in one fetch.
//!
//! Errors from a command are printed and the loop carries on.

use super::commands::AppContext;
use super::render::{print_messages, render_dashboard, render_delete_plan, render_detail};
use super::styles::THEME;
use godown::commands::CmdResult;
use godown::error::{GodownError, Result};
use godown::filter::FilterField;
use godown::model::{ItemDraft, LocationDraft};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;

const HELP: &str = "\
Commands:
  tree                       redraw the dashboard
  open ID | close ID         expand or collapse a location
  click ID                   toggle and select a location
  select ID                  select a location or an item
  unselect                   clear the selection
  expand-all | collapse-all
  filter category|brand|status VALUE
  clear-filters
  godown NAME                create a godown
  sub PARENT_ID NAME         create a sub-location
  add ID                     open the add-item form for a sub-location
  rm ID [--cascade]          delete a location
  rm-item ID                 delete an item
  refresh                    fetch everything again
  help | quit";

pub fn run(ctx: &mut AppContext) -> Result<()> {
    let lines = spawn_reader();
    let mut shell = Shell { ctx, lines };

    shell.loading();
    let first = shell.ctx.api.refresh()?;
    shell.redraw();
    print_messages(&first.messages);
    println!("{}", THEME.muted.apply_to("Type 'help' for commands."));
    shell.repl()
}

fn spawn_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

enum Flow {
    Continue,
    Quit,
}

struct Shell<'a> {
    ctx: &'a mut AppContext,
    lines: Receiver<String>,
}

impl Shell<'_> {
    fn repl(&mut self) -> Result<()> {
        self.prompt()?;
        loop {
            let line = match self.ctx.api.filter_pending(Instant::now()) {
                Some(wait) => match self.lines.recv_timeout(wait) {
                    Ok(line) => line,
                    Err(RecvTimeoutError::Timeout) => {
                        self.settle_filters();
                        self.prompt()?;
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match self.lines.recv() {
                    Ok(line) => line,
                    Err(_) => break,
                },
            };

            match self.execute(line.trim()) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => eprintln!("{}", THEME.error.apply_to(format!("Error: {}", e))),
            }
            self.prompt()?;
        }
        println!();
        Ok(())
    }

    fn prompt(&self) -> Result<()> {
        print!("godown> ");
        io::stdout().flush()?;
        Ok(())
    }

    fn redraw(&self) {
        let dashboard = self.ctx.api.dashboard();
        print!("{}", render_dashboard(&dashboard));
        let detail = render_detail(&dashboard.detail);
        if !detail.is_empty() {
            println!();
            print!("{}", detail);
        }
    }

    fn loading(&self) {
        println!("{}", THEME.muted.apply_to("Loading…"));
    }

    fn settle_filters(&mut self) {
        self.loading();
        match self.ctx.api.poll_filters(Instant::now()) {
            Ok(Some(result)) => {
                self.redraw();
                print_messages(&result.messages);
            }
            Ok(None) => {}
            Err(e) => eprintln!("{}", THEME.error.apply_to(format!("Error: {}", e))),
        }
    }

    fn execute(&mut self, line: &str) -> Result<Flow> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = words.collect();
        let api = &mut self.ctx.api;

        match command {
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            "help" | "?" => {
                println!("{}", HELP);
                return Ok(Flow::Continue);
            }
            "tree" => {}
            "refresh" => {
                self.loading();
                let result = self.ctx.api.refresh()?;
                return self.report(result);
            }
            "open" => api.expand(arg(&args, 0, "ID")?)?,
            "close" => {
                let id = arg(&args, 0, "ID")?;
                if api.view_state().is_expanded(id) {
                    api.toggle(id)?;
                }
            }
            "click" => {
                api.activate_location(arg(&args, 0, "ID")?)?;
            }
            "select" => {
                let id = arg(&args, 0, "ID")?;
                if api.store().location(id).is_some() {
                    api.select_location(id)?;
                } else {
                    api.select_item(id)?;
                }
            }
            "unselect" => api.clear_selection(),
            "expand-all" => api.expand_all(),
            "collapse-all" => api.collapse_all(),
            "filter" => {
                let field: FilterField = arg(&args, 0, "category|brand|status")?.parse()?;
                let value = args.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
                api.edit_filter(field, &value, Instant::now());
                return Ok(Flow::Continue);
            }
            "clear-filters" => {
                api.clear_filters(Instant::now());
                return Ok(Flow::Continue);
            }
            "godown" => {
                let result = api.create_location(&LocationDraft::godown(rest(&args, 0)))?;
                return self.report(result);
            }
            "sub" => {
                let parent = arg(&args, 0, "PARENT_ID")?;
                let draft = LocationDraft::sub_location(rest(&args, 1), parent);
                let result = api.create_location(&draft)?;
                return self.report(result);
            }
            "add" => {
                let id = arg(&args, 0, "ID")?.to_string();
                api.request_add_item(&id)?;
                self.redraw();
                return self.add_item_form(&id);
            }
            "rm" => {
                let id = arg(&args, 0, "ID")?.to_string();
                let cascade = args.contains(&"--cascade");
                return self.delete_location(&id, cascade);
            }
            "rm-item" => {
                let result = api.delete_item(arg(&args, 0, "ID")?)?;
                return self.report(result);
            }
            other => {
                return Err(GodownError::validation(format!(
                    "Unknown command '{}'. Type 'help' for commands.",
                    other
                )))
            }
        }
        self.redraw();
        Ok(Flow::Continue)
    }

    fn report(&self, result: CmdResult) -> Result<Flow> {
        self.redraw();
        print_messages(&result.messages);
        Ok(Flow::Continue)
    }

    /// Reads one answer. `None` when input has ended.
    fn ask(&self, question: &str) -> Result<Option<String>> {
        print!("{}: ", question);
        io::stdout().flush()?;
        Ok(self.lines.recv().ok().map(|l| l.trim().to_string()))
    }

    fn ask_yes_no(&self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} [y/N]", question))?;
        Ok(matches!(
            answer.as_deref().map(str::to_lowercase).as_deref(),
            Some("y") | Some("yes")
        ))
    }

    /// Walks through the item fields. Typing `cancel` at any prompt closes the form.
    fn add_item_form(&mut self, location_id: &str) -> Result<Flow> {
        let questions = [
            "Name",
            "Quantity",
            "Category",
            "Price",
            "Brand",
            "Status (in_stock/out_of_stock, empty for in_stock)",
            "Attributes as JSON (optional)",
            "Image URL (optional)",
        ];
        let mut answers = Vec::with_capacity(questions.len());
        for question in questions {
            match self.ask(question)? {
                Some(answer) if answer != "cancel" => answers.push(answer),
                _ => {
                    self.ctx.api.cancel_add_item();
                    self.redraw();
                    return Ok(Flow::Continue);
                }
            }
        }
        let mut answers = answers.into_iter();
        let mut next = || answers.next().unwrap_or_default();
        let draft = ItemDraft {
            name: next(),
            quantity: next(),
            category: next(),
            price: next(),
            brand: next(),
            status: next(),
            attributes: next(),
            image_url: next(),
        };

        let pending = self.ctx.api.prepare_item(location_id, &draft)?;
        let confirmed =
            pending.needs_confirmation() && self.ask_yes_no(&pending.confirmation_prompt())?;
        if pending.needs_confirmation() && !confirmed {
            println!("Cancelled. The form is still open; 'add {}' to retry.", location_id);
            return Ok(Flow::Continue);
        }

        let result = self.ctx.api.create_item(location_id, &draft, confirmed)?;
        self.report(result)
    }

    fn delete_location(&mut self, id: &str, cascade: bool) -> Result<Flow> {
        let plan = self.ctx.api.delete_location_preview(id)?;
        if plan.has_contents() && cascade {
            print!("{}", render_delete_plan(&plan));
            if !self.ask_yes_no("Delete all of this?")? {
                println!("Cancelled.");
                return Ok(Flow::Continue);
            }
        }
        let result = self.ctx.api.delete_location(id, cascade)?;
        self.report(result)
    }
}

fn arg<'a>(args: &[&'a str], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| GodownError::validation(format!("Missing {}", name)))
}

fn rest(args: &[&str], from: usize) -> String {
    args.get(from..).map(|r| r.join(" ")).unwrap_or_default()
}
