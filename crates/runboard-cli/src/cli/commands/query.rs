use crate::cli::args::{GetArgs, HeatmapArgs, ProjectsArgs, ResultsArgs};
use crate::cli::helpers::emit;
use runboard_core::api::{self, route};
use runboard_core::{QueryFacade, ResultStore, ResultsQuery};

pub fn results(store: ResultStore, args: ResultsArgs) -> anyhow::Result<i32> {
    let facade = QueryFacade::new(store);
    emit(&api::results(&facade, &to_query(args)))
}

pub fn heatmap(store: ResultStore, args: HeatmapArgs) -> anyhow::Result<i32> {
    let facade = QueryFacade::new(store);
    emit(&api::heatmap(&facade, args.project.as_deref()))
}

pub fn projects(store: ResultStore, args: ProjectsArgs) -> anyhow::Result<i32> {
    let facade = QueryFacade::new(store);
    match args.project.as_deref() {
        Some(project) => emit(&api::project(&facade, project)),
        None => emit(&api::projects(&facade)),
    }
}

pub fn get(store: ResultStore, args: GetArgs) -> anyhow::Result<i32> {
    let facade = QueryFacade::new(store);
    emit(&route(&facade, &args.method, &args.target))
}

fn to_query(args: ResultsArgs) -> ResultsQuery {
    let mut query = ResultsQuery::new().latest(args.latest);
    if let Some(project) = args.project {
        query = query.with_project(project);
    }
    if let Some(repo) = args.repo {
        query = query.with_repo(repo);
    }
    if let Some(weeks) = args.weeks_ago {
        query = query.with_weeks_ago(weeks);
    }
    query
}
