use flow_sync::{BuilderSession, CommitError, CommitOrchestrator, SyncConfig};
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use step_domain::{parse_params, ActionStep, DelayUnit, HttpMethod, HttpRequest, MoveToList, SendEmail, Step};
use tracing_subscriber::EnvFilter;

/// Menú interactivo para editar los pasos de un flow.
///
/// Las ediciones se guardan como borrador local (sobreviven a un cierre del
/// programa) hasta que se confirman con "Guardar".
///
/// Configuración por entorno (o `.env`):
/// - `STEPS_API_URL` / `STEPS_API_TOKEN`: servicio remoto de pasos.
/// - `DRAFT_DB_URL`: fichero SQLite de borradores.
/// - `STEP_CALL_TIMEOUT_MS` / `STEP_REORDER_CONCURRENCY`: límites del commit.
/// - `RUST_LOG`: filtro de logs (por defecto `info`).
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .init();

    let service = step_persistence::new_step_service_from_env()?;
    let drafts = step_persistence::new_draft_repo_from_env()?;
    let engine = Arc::new(CommitOrchestrator::new(Arc::new(service), Arc::new(drafts), SyncConfig::from_env()));

    let flow_id = match std::env::args().nth(1) {
        Some(id) => id,
        None => prompt("Flow id: ")?.trim().to_string(),
    };
    if flow_id.is_empty() {
        eprintln!("Se necesita un flow id");
        return Ok(());
    }
    let mut session = BuilderSession::open(flow_id, engine).await?;
    if session.has_unsaved_changes() {
        println!("Se recuperó un borrador con cambios sin guardar.");
    }

    loop {
        println!("\n== Flow {} {}==", session.flow_id(), if session.has_unsaved_changes() { "(sin guardar) " } else { "" });
        println!("1) Ver pasos");
        println!("2) Añadir espera");
        println!("3) Añadir acción");
        println!("4) Cambiar título de un paso");
        println!("5) Mover paso");
        println!("6) Eliminar paso");
        println!("7) Ver cambios pendientes");
        println!("8) Guardar");
        println!("9) Descartar cambios");
        println!("10) Recargar desde el servidor");
        println!("11) Modificar cabecera (JSON)");
        println!("0) Salir");
        let choice = prompt("Elige una opción: ")?;
        match choice.trim() {
            "1" => print_steps(&session),
            "2" => {
                let amount: f64 = match prompt("Cantidad: ")?.trim().parse() {
                    Ok(n) => n,
                    Err(_) => { eprintln!("Cantidad inválida"); continue; }
                };
                let unit_s = prompt("Unidad (minutes/hours/days/weeks/months): ")?;
                let Some(unit) = DelayUnit::parse(&unit_s) else { eprintln!("Unidad inválida"); continue; };
                let title = prompt("Título (enter para el predeterminado): ")?;
                match session.push_step(Step::delay(title.trim(), amount, unit)) {
                    Ok(id) => println!("Paso añadido: {}", id),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            "3" => {
                let action = match read_action()? {
                    Some(a) => a,
                    None => continue,
                };
                let title = prompt("Título (enter para el predeterminado): ")?;
                match session.push_step(Step::action(title.trim(), action)) {
                    Ok(id) => println!("Paso añadido: {}", id),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            "4" => {
                let Some(index) = read_position(&session, "Posición del paso: ")? else { continue };
                let step = session.steps()[index].clone();
                let title = prompt("Nuevo título: ")?;
                if let Err(e) = session.update_step(&step.id, title.trim(), step.kind) {
                    eprintln!("Error: {}", e);
                }
            }
            "5" => {
                let Some(from) = read_position(&session, "Posición actual: ")? else { continue };
                let Some(to) = read_position(&session, "Nueva posición: ")? else { continue };
                if let Err(e) = session.move_step(from, to) {
                    eprintln!("Error: {}", e);
                }
            }
            "6" => {
                let Some(index) = read_position(&session, "Posición del paso a eliminar: ")? else { continue };
                let id = session.steps()[index].id.clone();
                match session.remove_step(&id) {
                    Ok(step) => println!("Eliminado: {}", step),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            "7" => {
                let diff = session.pending_diff();
                println!("Nuevos: {}  Modificados: {}  Eliminados: {}",
                         diff.created.len(),
                         diff.updated.len(),
                         diff.deleted.len());
                for s in diff.created.iter().chain(diff.updated.iter()) {
                    println!("  ~ {}", s);
                }
                for s in &diff.deleted {
                    println!("  - {}", s);
                }
                if let Some(patch) = session.automation_patch() {
                    println!("Cabecera pendiente: {}", patch);
                }
            }
            "8" => match session.commit().await {
                Ok(outcome) => {
                    println!("Guardado: {} pasos", outcome.steps.len());
                    if let Some(patch) = outcome.automation_patch {
                        println!("Cabecera pendiente de aplicar: {}", patch);
                    }
                }
                Err(e @ CommitError::Failed { .. }) if e.is_partial() => {
                    eprintln!("Guardado incompleto: {}", e);
                    eprintln!("El servidor quedó con parte de los cambios; al guardar de nuevo sólo se envía lo pendiente.");
                }
                Err(e) => eprintln!("No se pudo guardar: {}", e),
            },
            "9" => {
                let confirm = prompt("¿Descartar todos los cambios? escribir 'si' para confirmar: ")?;
                if confirm.trim().eq_ignore_ascii_case("si") {
                    session.discard();
                    println!("Cambios descartados");
                }
            }
            "10" => {
                if let Err(e) = session.reload().await {
                    eprintln!("Error recargando: {}", e);
                }
            }
            "11" => {
                let raw = prompt("Patch JSON (ej: {\"name\": \"Bienvenida\"}): ")?;
                match serde_json::from_str(raw.trim()) {
                    Ok(patch) => session.patch_automation(patch),
                    Err(e) => eprintln!("JSON inválido: {}", e),
                }
            }
            "0" => {
                if session.has_unsaved_changes() {
                    println!("Los cambios sin guardar quedan en el borrador.");
                }
                break;
            }
            _ => eprintln!("Opción no válida"),
        }
    }
    Ok(())
}

fn print_steps(session: &BuilderSession) {
    if session.steps().is_empty() {
        println!("(sin pasos)");
        return;
    }
    for (i, step) in session.steps().iter().enumerate() {
        let marker = if step.is_local() { "*" } else { " " };
        println!("{:>3}{} {}", i + 1, marker, step);
    }
}

/// Lee una posición 1-based y la convierte a índice.
fn read_position(session: &BuilderSession, msg: &str) -> io::Result<Option<usize>> {
    let raw = prompt(msg)?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= session.steps().len() => Ok(Some(n - 1)),
        _ => {
            eprintln!("Posición inválida");
            Ok(None)
        }
    }
}

fn read_action() -> io::Result<Option<ActionStep>> {
    println!("  1) Enviar email");
    println!("  2) Webhook HTTP");
    println!("  3) Mover a otra lista");
    println!("  4) Quitar de la lista actual");
    println!("  5) Eliminar suscriptor");
    let kind = prompt("Tipo de acción: ")?;
    let action = match kind.trim() {
        "1" => {
            let template_id = prompt("Plantilla (id): ")?.trim().to_string();
            let subject = prompt("Asunto: ")?.trim().to_string();
            ActionStep::SendEmail(SendEmail { template_id, subject })
        }
        "2" => {
            let method_s = prompt("Método (GET/POST/PUT/PATCH/DELETE): ")?;
            let Some(method) = HttpMethod::parse(&method_s) else {
                eprintln!("Método inválido");
                return Ok(None);
            };
            let mut req = HttpRequest::new(method, prompt("URL: ")?.trim());
            req.query = parse_params(prompt("Query (k=v&k2=v2): ")?.trim());
            req.headers = parse_params(prompt("Cabeceras (k=v&k2=v2): ")?.trim());
            req.body = prompt("Cuerpo: ")?.trim().to_string();
            if let Ok(n) = prompt("Reintentos (enter para 1): ")?.trim().parse() {
                req.retry_attempts = n;
            }
            if let Ok(n) = prompt("Segundos entre reintentos (enter para 60): ")?.trim().parse() {
                req.retry_delay_seconds = n;
            }
            ActionStep::HttpRequest(req)
        }
        "3" => {
            let target_list_id = prompt("Lista destino (id): ")?.trim().to_string();
            ActionStep::MoveToList(MoveToList { target_list_id })
        }
        "4" => ActionStep::DeleteFromCurrentList,
        "5" => ActionStep::DeleteSubscriber,
        _ => {
            eprintln!("Tipo inválido");
            return Ok(None);
        }
    };
    Ok(Some(action))
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
