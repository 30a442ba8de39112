use std::io::{self, BufRead, Write};

use tracing::info;

use thanks_core::model::{Candidate, MentionKind, PostId, ReportId};
use thanks_core::moderation::{ReportStatus, ViewScope};
use thanks_engine::transport::{Feed, Transport};
use thanks_session::{
    AlwaysConfirm, Confirm, InputEvent, LikeBoard, LookupRequest, MentionResolver, ModerationBoard,
    ViewId,
};

/// Asks on the terminal; anything but `y`/`yes` declines.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

fn run_lookup(transport: &dyn Transport, resolver: &mut MentionResolver, req: LookupRequest) {
    match req {
        LookupRequest::Users { ticket, query } => {
            let result = transport
                .search_users(&query)
                .map(|users| users.into_iter().map(Candidate::from).collect())
                .map_err(|e| e.to_string());
            resolver.receive_candidates(ticket, result);
        }
        LookupRequest::Departments { ticket } => {
            let result = transport
                .list_departments()
                .map(|list| list.into_iter().map(Candidate::from).collect())
                .map_err(|e| e.to_string());
            resolver.receive_departments(ticket, result);
        }
    }
}

/// Type `query` into the mention box and list what the dropdown would show.
pub fn search_cmd(transport: &dyn Transport, kind: MentionKind, query: &str) {
    let mut resolver = MentionResolver::new();
    if let Some(req) = resolver.set_kind(kind) {
        run_lookup(transport, &mut resolver, req);
    }
    let req = die!(
        resolver.handle_input(InputEvent::Text(query.to_string())),
        "Error: {}"
    );
    if let Some(req) = req {
        run_lookup(transport, &mut resolver, req);
    }
    if let Some(err) = resolver.error() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
    if resolver.candidates().is_empty() {
        println!("(no candidates for {:?})", resolver.query());
        return;
    }
    for c in resolver.candidates() {
        match &c.extra_label {
            Some(label) => println!("{}\t{}\t{label}", c.id, c.name),
            None => println!("{}\t{}", c.id, c.name),
        }
    }
}

pub fn posts_cmd(transport: &dyn Transport, feed: Feed, json: bool) {
    let posts = die!(transport.timeline(feed), "Error fetching posts: {}");
    if json {
        let rows: Vec<_> = posts
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.id,
                    "content": p.content,
                    "created_at": p.created_at,
                    "like_count": p.like_count,
                    "liked_by_me": p.liked_by_me,
                })
            })
            .collect();
        println!("{}", die!(serde_json::to_string_pretty(&rows), "Error: {}"));
        return;
    }
    for p in &posts {
        let mark = if p.liked_by_me { "♥" } else { " " };
        println!("{}\t{mark}{}\t{}\t{}", p.id, p.like_count, p.created_at, p.content);
    }
    println!("---");
    println!("{} posts", posts.len());
}

/// Drive the like button to `on`, following the optimistic controller.
pub fn like_cmd(transport: &dyn Transport, post_id: PostId, on: bool) {
    let posts = die!(transport.timeline(Feed::All), "Error fetching posts: {}");
    let mut board = LikeBoard::new();
    board.load_timeline(&posts);
    let Some(before) = board.state(post_id) else {
        eprintln!("Error: post {post_id} is not on the timeline");
        std::process::exit(1);
    };
    if before.on == on {
        println!("Unchanged: post {post_id} {} ({})", verb(on), before.count);
        return;
    }

    let mut next = board.toggle(post_id);
    while let Some(req) = next {
        let result = transport.set_like(req.post_id, req.liked);
        if let Err(e) = &result {
            eprintln!("Request failed: {e}");
        }
        next = board.complete(req.post_id, req.ticket, result.is_ok());
    }
    if let Some(after) = board.state(post_id) {
        info!(post_id, liked = after.on, "like settled");
        println!("Post {post_id} {} ({})", verb(after.on), after.count);
    }
}

fn verb(on: bool) -> &'static str {
    if on {
        "liked"
    } else {
        "not liked"
    }
}

fn load_view(transport: &dyn Transport, board: &mut ModerationBoard, scope: ViewScope) -> ViewId {
    let (view, req) = board.open_view(scope);
    let result = transport.admin_posts(req.scope).map_err(|e| e.to_string());
    board.receive_view(view, req.ticket, result);
    if let Some(err) = board.error() {
        eprintln!("Error loading {} posts: {err}", scope.as_str());
        std::process::exit(1);
    }
    view
}

pub fn moderate_list_cmd(transport: &dyn Transport, scope: ViewScope, query: &str) {
    let mut board = ModerationBoard::new();
    let view = load_view(transport, &mut board, scope);
    let posts = board.filtered(view, query);
    for p in &posts {
        let status = p.status.map_or("-".to_string(), |s| s.to_string());
        println!("{}\t{status}\t{}\t{}", p.id, p.created_at, p.content);
        for r in &p.reports {
            let who = r.reporter_name.as_deref().unwrap_or("?");
            println!("  #{}\t{}\t{who}\t{}", r.id, r.status, r.reason);
        }
    }
    println!("---");
    println!("{} posts", posts.len());
}

pub fn moderate_set_cmd(
    transport: &dyn Transport,
    report_id: ReportId,
    status: ReportStatus,
    assume_yes: bool,
) {
    let mut board = ModerationBoard::new();
    load_view(transport, &mut board, ViewScope::All);
    let confirmer: &dyn Confirm = if assume_yes {
        &AlwaysConfirm
    } else {
        &StdinConfirm
    };
    let req = die!(
        board.apply_status(report_id, status, confirmer),
        "Error: {}"
    );
    let Some(req) = req else {
        println!("No change");
        return;
    };
    let result = transport
        .update_report_status(req.report_id, req.status)
        .map_err(|e| e.to_string());
    board.receive_status(req.ticket, result);
    if let Some(err) = board.error() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
    if let Some(report) = board.report(report_id) {
        let post = board
            .status_of(report.post_id)
            .map_or("-".to_string(), |s| s.to_string());
        println!(
            "Report #{report_id} is {}; post {} is {post}",
            report.status, report.post_id
        );
    }
}
