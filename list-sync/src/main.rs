use list_sync::{
    DragController, GestureEvent, StepDirection, SyncWorker, open_document_store, setup_environment,
};
use shared::intent::CrudAction;
use shared::models::OrderedItemCreate;

const DEMO_ITEMS: &[&str] = &["Drink 2L of water", "Fruit with breakfast", "30 min walk"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. dotenv, config, logger
    let config = setup_environment()?;
    let collection = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "instructions".to_string());

    tracing::info!(%collection, "list-sync starting...");

    // 2. store + worker
    let store = open_document_store(&config)?;
    let handle = SyncWorker::spawn(store, collection.as_str(), &config).await?;

    if handle.view().items.is_empty() {
        for title in DEMO_ITEMS {
            handle
                .dispatch(CrudAction::Create(OrderedItemCreate {
                    title: title.to_string(),
                    body: None,
                }))
                .await?;
        }
    }

    // 3. keyboard drag: lift the last item and drop it at the top
    let mut view = handle.watch();
    let items = view.borrow().items.clone();
    if let Some(last) = items.last().filter(|_| items.len() > 1) {
        let mut drag = DragController::new();
        let mut sink = handle.sink();
        drag.dispatch(GestureEvent::Lift { id: last.id.clone() }, &items, &mut sink);
        for _ in 1..items.len() {
            drag.dispatch(
                GestureEvent::Step {
                    direction: StepDirection::Up,
                },
                &items,
                &mut sink,
            );
        }
        drag.dispatch(GestureEvent::Drop, &items, &mut sink);

        view.wait_for(|v| v.last_outcome.is_some() && !v.provisional)
            .await?;
    }

    for item in &handle.view().items {
        tracing::info!(order = item.order, id = %item.id, title = %item.title, "item");
    }

    handle.shutdown().await;
    Ok(())
}
