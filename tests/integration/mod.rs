mod test_cli;
mod test_git;
mod test_workflow;
