/// Popup UI for Linkspace extension

use crate::browser::{self, ChromeWindows, RuntimeMessenger};
use crate::config::Theme;
use crate::error::LinkspaceError;
use crate::operations::{
    ProjectRow, delete_project, display_order, mark_closed, save_current_window, sync_pull, sync_push,
};
use crate::project::Project;
use crate::providers::{Provider, SyncProvider};
use crate::windows::WindowTracker;
use patternfly_yew::prelude::*;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Clone, PartialEq)]
enum AppState {
    Idle,
    Loading(String),
    Notice(String),
    Error(String),
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| AppState::Loading("Loading projects...".to_string()));
    let rows = use_state(Vec::<ProjectRow>::new);
    let name_input = use_state(String::new);
    let provider_label = use_state(|| "Local".to_string());
    let theme = use_state(Theme::default);

    // Reload the list from storage; every action ends with this
    let refresh = {
        let rows = rows.clone();
        let state = state.clone();
        Callback::from(move |next: AppState| {
            let rows = rows.clone();
            let state = state.clone();
            spawn_local(async move {
                match load_rows().await {
                    Ok(loaded) => {
                        rows.set(loaded);
                        state.set(next);
                    }
                    Err(e) => state.set(AppState::Error(format!("Failed to load: {}", e))),
                }
            });
        })
    };

    // Load projects, provider and theme on mount
    {
        let refresh = refresh.clone();
        let provider_label = provider_label.clone();
        let theme = theme.clone();
        use_effect_with((), move |_| {
            refresh.emit(AppState::Idle);
            spawn_local(async move {
                let ctx = browser::context();
                if let Ok(provider) = Provider::active(&ctx).await {
                    provider_label.set(provider.label().to_string());
                }
                match browser::store().theme().await {
                    Ok(stored) => {
                        apply_theme(stored);
                        theme.set(stored);
                    }
                    Err(e) => log::warn!("Could not read theme: {}", e),
                }
            });
            || ()
        });
    }

    let on_name_input = {
        let name_input = name_input.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                name_input.set(input.value());
            }
        })
    };

    let on_save = {
        let state = state.clone();
        let name_input = name_input.clone();
        let refresh = refresh.clone();
        Callback::from(move |_| {
            let state = state.clone();
            let name_input = name_input.clone();
            let refresh = refresh.clone();
            let name = (*name_input).clone();
            state.set(AppState::Loading("Saving window...".to_string()));
            spawn_local(async move {
                match save_current_window(&browser::store(), &ChromeWindows, &name, chrono::Local::now()).await {
                    Ok(Some(project)) => {
                        name_input.set(String::new());
                        refresh.emit(AppState::Notice(format!("Saved \"{}\"", project.name)));
                    }
                    Ok(None) => state.set(AppState::Notice("No tabs to save".to_string())),
                    Err(e) => state.set(AppState::Error(format!("Save failed: {}", e))),
                }
            });
        })
    };

    let on_open = {
        let state = state.clone();
        let refresh = refresh.clone();
        Callback::from(move |project: Project| {
            let state = state.clone();
            let refresh = refresh.clone();
            spawn_local(async move {
                let tracker = WindowTracker::new(browser::store());
                match tracker.open_project(&project, &ChromeWindows, &RuntimeMessenger).await {
                    Ok(_) => refresh.emit(AppState::Idle),
                    Err(e) => state.set(AppState::Error(format!("Open failed: {}", e))),
                }
            });
        })
    };

    // The background clears the map on windows.onRemoved, which can land
    // after this returns, so the row is marked closed locally
    let on_close = {
        let state = state.clone();
        let rows = rows.clone();
        Callback::from(move |project: Project| {
            let state = state.clone();
            let rows = rows.clone();
            spawn_local(async move {
                let tracker = WindowTracker::new(browser::store());
                match tracker.close_project(&project, &ChromeWindows, confirm_close).await {
                    Ok(true) => {
                        rows.set(mark_closed(&rows, &project.id));
                        state.set(AppState::Idle);
                    }
                    Ok(false) => {}
                    Err(e) => state.set(AppState::Error(format!("Close failed: {}", e))),
                }
            });
        })
    };

    let on_delete = {
        let state = state.clone();
        let refresh = refresh.clone();
        Callback::from(move |project_id: Uuid| {
            let state = state.clone();
            let refresh = refresh.clone();
            spawn_local(async move {
                match delete_project(&browser::store(), &project_id).await {
                    Ok(_) => refresh.emit(AppState::Idle),
                    Err(e) => state.set(AppState::Error(format!("Delete failed: {}", e))),
                }
            });
        })
    };

    let on_pull = {
        let state = state.clone();
        let refresh = refresh.clone();
        Callback::from(move |_| {
            let state = state.clone();
            let refresh = refresh.clone();
            state.set(AppState::Loading("Pulling...".to_string()));
            spawn_local(async move {
                match pull_active().await {
                    Ok(count) => refresh.emit(AppState::Notice(format!("Pulled {} projects", count))),
                    Err(e) => state.set(AppState::Error(format!("Pull failed: {}", e))),
                }
            });
        })
    };

    let on_push = {
        let state = state.clone();
        Callback::from(move |_| {
            let state = state.clone();
            state.set(AppState::Loading("Pushing...".to_string()));
            spawn_local(async move {
                match push_active().await {
                    Ok(count) => state.set(AppState::Notice(format!("Pushed {} projects", count))),
                    Err(e) => state.set(AppState::Error(format!("Push failed: {}", e))),
                }
            });
        })
    };

    let on_toggle_theme = {
        let theme = theme.clone();
        let state = state.clone();
        Callback::from(move |_| {
            let next = theme.toggled(system_prefers_dark());
            let theme = theme.clone();
            let state = state.clone();
            spawn_local(async move {
                match browser::store().set_theme(next.as_str()).await {
                    Ok(stored) => {
                        apply_theme(stored);
                        theme.set(stored);
                    }
                    Err(e) => state.set(AppState::Error(format!("Failed to save theme: {}", e))),
                }
            });
        })
    };

    let is_busy = matches!(*state, AppState::Loading(_));

    html! {
        <div class="padding-20">
            <div class="popup-header">
                <h1 class="popup-title">{"Linkspace"}</h1>
                <Button onclick={on_toggle_theme} variant={ButtonVariant::Plain}>
                    {if theme.is_dark(system_prefers_dark()) { "☀️" } else { "🌙" }}
                </Button>
            </div>

            <div class="save-row">
                <input
                    type="text"
                    placeholder="Project name"
                    value={(*name_input).clone()}
                    oninput={on_name_input}
                    class="project-name-input"
                />
                <Button onclick={on_save} disabled={is_busy} variant={ButtonVariant::Primary}>
                    {"Save window"}
                </Button>
            </div>

            // Status display
            {match &*state {
                AppState::Loading(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                AppState::Notice(msg) => html! {
                    <Alert r#type={AlertType::Info} title={msg.clone()} inline={true}>
                    </Alert>
                },
                AppState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    </div>
                },
                AppState::Idle => html! {}
            }}

            <div class="project-list">
                if rows.is_empty() {
                    <p class="empty-list">{"No projects yet"}</p>
                }
                {for rows.iter().map(|row| html! {
                    <ProjectCard
                        key={row.project.id.to_string()}
                        row={row.clone()}
                        on_open={on_open.clone()}
                        on_close={on_close.clone()}
                        on_delete={on_delete.clone()}
                    />
                })}
            </div>

            <div class="sync-row">
                <span class="provider-label">{format!("Sync: {}", *provider_label)}</span>
                <Button onclick={on_pull} disabled={is_busy} variant={ButtonVariant::Secondary}>
                    {"Pull"}
                </Button>
                <Button onclick={on_push} disabled={is_busy} variant={ButtonVariant::Secondary}>
                    {"Push"}
                </Button>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ProjectCardProps {
    row: ProjectRow,
    on_open: Callback<Project>,
    on_close: Callback<Project>,
    on_delete: Callback<Uuid>,
}

#[function_component(ProjectCard)]
fn project_card(props: &ProjectCardProps) -> Html {
    let project = &props.row.project;
    let created = chrono::DateTime::from_timestamp_millis(project.created_at)
        .map(|utc| utc.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    let card_class = if props.row.active { "project-card active" } else { "project-card" };

    html! {
        <div class={card_class}>
            <div class="project-info">
                <h3 class="project-name">{&project.name}</h3>
                <p class="project-meta">
                    {format!("{} • {} tabs", created, project.urls.len())}
                </p>
            </div>
            <div class="project-actions">
                <Button
                    onclick={props.on_open.reform({
                        let project = project.clone();
                        move |_| project.clone()
                    })}
                >
                    {if props.row.active { "Focus" } else { "Open" }}
                </Button>
                if props.row.active {
                    <Button
                        onclick={props.on_close.reform({
                            let project = project.clone();
                            move |_| project.clone()
                        })}
                        variant={ButtonVariant::Secondary}
                    >
                        {"Close"}
                    </Button>
                }
                <Button
                    onclick={props.on_delete.reform({
                        let id = project.id;
                        move |_| id
                    })}
                    variant={ButtonVariant::Danger}
                >
                    {"Delete"}
                </Button>
            </div>
        </div>
    }
}

// Helper functions

async fn load_rows() -> Result<Vec<ProjectRow>, LinkspaceError> {
    let store = browser::store();
    let projects = store.projects().await?;
    let open = store.open_map().await?;
    Ok(display_order(&projects, &open))
}

async fn pull_active() -> Result<usize, LinkspaceError> {
    let ctx = browser::context();
    let provider = Provider::active(&ctx).await?;
    Ok(sync_pull(&provider).await?.len())
}

async fn push_active() -> Result<usize, LinkspaceError> {
    let ctx = browser::context();
    let provider = Provider::active(&ctx).await?;
    sync_push(&ctx.store, &provider).await
}

fn confirm_close(project: &Project) -> bool {
    web_sys::window()
        .and_then(|w| {
            w.confirm_with_message(&format!("Close the window for \"{}\"?", project.name))
                .ok()
        })
        .unwrap_or(false)
}

fn system_prefers_dark() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .map(|query| query.matches())
        .unwrap_or(false)
}

fn apply_theme(theme: Theme) {
    let root = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.document_element());
    if let Some(root) = root {
        let mode = if theme.is_dark(system_prefers_dark()) { "dark" } else { "light" };
        if let Err(e) = root.set_attribute("data-theme", mode) {
            log::warn!("Could not apply theme: {:?}", e);
        }
    }
}
